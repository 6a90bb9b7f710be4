//! Node identity: Ed25519 keypairs and the peer ids derived from them.

mod error;
mod keypair;
mod peer_id;

pub use error::{IdentityError, IdentityResult};
pub use keypair::Keypair;
pub use peer_id::PeerId;
