//! Token handling and session authentication.
//!
//! - `claims` - token claim set
//! - `codec` - signing, verification and token issuance
//! - `validator` - claim-level checks on decoded refresh tokens
//! - `revocation` - revocation records and the availability rule
//! - `session` - bearer authentication sequence
//! - `users` - user lookup contract for the strict flow

pub mod claims;
pub mod codec;
pub mod revocation;
pub mod session;
pub mod users;
pub mod validator;

pub use claims::TokenClaims;
pub use codec::TokenCodec;
pub use revocation::{RevocationOracle, RevocationRecord};
pub use session::{AuthenticatedUser, SessionAuthenticator};
pub use users::{UserEntity, UserLookup};
pub use validator::{TokenValidator, ValidationIssue};
