//! Integration tests for error types

#[cfg(test)]
mod tests {
    use pkgsig_errors::*;

    #[test]
    fn test_error_conversion() {
        let pkg_err = PackageError::NotAPackage;
        let err: Error = pkg_err.into();
        assert!(matches!(err, Error::Package(_)));
    }

    #[test]
    fn test_error_display() {
        let err = PackageError::IllegalSignatureType { sigtype: 1 };
        assert_eq!(err.to_string(), "illegal signature type: 1");
    }

    #[test]
    fn test_error_clone() {
        let err = SigningError::Unsupported {
            what: "public key algorithm".into(),
            id: 17,
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err = Error::io_with_path(&io_err, "/keys/trusted_keys.json");
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                path: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_json_error_is_internal() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.user_code(), Some("error.internal"));
    }

    #[test]
    fn test_user_codes_follow_domain() {
        let err: Error = SigningError::InvalidArmor("no marker".into()).into();
        assert_eq!(err.user_code(), Some("signing.invalid_armor"));
        assert!(err.user_hint().is_some());

        let err: Error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(err.user_code(), Some("error.io"));
        assert!(err.is_retryable());
    }
}
