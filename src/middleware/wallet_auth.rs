use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::metadata::is_valid_wallet_address;

/// Header carrying the caller's wallet address.
pub const WALLET_ADDRESS_HEADER: &str = "x-wallet-address";

/// The authenticated wallet address, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct WalletAddress(pub String);

/// Require and validate the wallet address header on every note and chain
/// route. The address is the owner identity for all wallet-scoped lookups.
pub async fn require_wallet_address(
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let address = req
        .headers()
        .get(WALLET_ADDRESS_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Wallet address required".to_string()))?;

    if !is_valid_wallet_address(&address) {
        return Err(AppError::Validation(
            "Invalid Cardano wallet address".to_string(),
        ));
    }

    req.extensions_mut().insert(WalletAddress(address));
    Ok(next.run(req).await)
}
