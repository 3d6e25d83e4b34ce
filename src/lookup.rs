use async_trait::async_trait;

use crate::engine::Error;
use crate::model::Address;

/// Postal-code → address resolution seam (an external HTTP service in
/// production). `Ok(None)` means the code did not resolve; `Err` is
/// reserved for infrastructure failure.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, postal_code: &str) -> Result<Option<Address>, Error>;
}

/// Lookup that resolves nothing. Useful when the deployment has no address
/// provider configured.
pub struct NoAddressLookup;

#[async_trait]
impl AddressLookup for NoAddressLookup {
    async fn lookup(&self, _postal_code: &str) -> Result<Option<Address>, Error> {
        Ok(None)
    }
}
