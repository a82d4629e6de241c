pub mod cors;
pub mod rate_limit;
pub mod wallet_auth;
