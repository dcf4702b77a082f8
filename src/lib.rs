//! AWS Signature Version 4 request signing.
//!
//! Given a parsed HTTP request and a credential, [`Signer`] computes the
//! SigV4 `Authorization` value and inserts it, together with `X-Amz-Date`,
//! into the request's headers. Everything around that stays with the
//! caller: loading credentials, issuing the request, and handling the
//! response.
//!
//! # Example
//!
//! ```no_run
//! use awssign::{Credential, Signer};
//!
//! fn main() -> awssign::Result<()> {
//!     let signer = Signer::new("s3", "us-east-1");
//!     let cred = Credential::new("access_key_id", "secret_access_key");
//!
//!     let (mut parts, body) = http::Request::builder()
//!         .method("GET")
//!         .uri("https://s3.amazonaws.com/testbucket")
//!         .body(())
//!         .expect("request must be valid")
//!         .into_parts();
//!
//!     // Signing request with Signer
//!     signer.sign(&mut parts, None::<&()>, &cred)?;
//!
//!     // Send the request with the client of your choice.
//!     let req = http::Request::from_parts(parts, body);
//!     # let _ = req;
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;

mod constants;

mod credential;
pub use credential::Credential;

mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;

mod request;
pub use request::SigningRequest;

mod sign;
pub use sign::Signer;
