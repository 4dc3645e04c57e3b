pub mod session;

pub use session::{IssuedToken, TokenError, TokenService, TOKEN_TTL_HOURS};
