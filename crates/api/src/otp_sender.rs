//! Out-of-band OTP delivery.
//!
//! SMS delivery is an external collaborator. [`OtpSender`] is the seam;
//! [`LogOtpSender`] is the default used when no provider is wired in.

use async_trait::async_trait;
use linkup_core::phone::{self, PhoneNumber};

#[derive(Debug, thiserror::Error)]
#[error("OTP delivery failed: {0}")]
pub struct OtpDeliveryError(pub String);

#[async_trait]
pub trait OtpSender: Send + Sync {
    /// Deliver `code` to the phone. Implementations must not log the code.
    async fn send(&self, phone: &PhoneNumber, code: &str) -> Result<(), OtpDeliveryError>;
}

/// Records the delivery request in the logs without the code itself.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, phone: &PhoneNumber, _code: &str) -> Result<(), OtpDeliveryError> {
        tracing::info!(
            country_code = %phone.country_code,
            phone = %phone::mask(&phone.phone_number),
            "OTP issued (no SMS provider configured)"
        );
        Ok(())
    }
}
