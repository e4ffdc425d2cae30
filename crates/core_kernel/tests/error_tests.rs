//! Tests for core_kernel error types

use core_kernel::{CoreError, Probability};

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_invalid_identifier_display() {
    let error = CoreError::invalid_identifier("ClaimId", "CLM-xyz", "invalid character");
    assert_eq!(error.to_string(), "Invalid ClaimId 'CLM-xyz': invalid character");
}

#[test]
fn test_probability_error_is_validation() {
    let err = Probability::new(2.0).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(err.to_string().contains("[0, 1]"));
}
