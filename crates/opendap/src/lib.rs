//! DAP2 (OPeNDAP) access to remote gridded datasets.
//!
//! Supports the subset of the protocol a GrADS Data Server exposes:
//! - `.dds` dataset structure
//! - `.das` attributes
//! - `.dods` binary data for a constraint expression (XDR encoded)

pub mod client;
pub mod das;
pub mod dds;
pub mod error;
mod lexer;
pub mod xdr;

pub use client::{hyperslab, ClientConfig, OpendapClient};
pub use das::{Attribute, Das};
pub use dds::{ArrayDecl, DapType, Dds, Declaration, Dimension};
pub use error::{OpendapError, OpendapResult};
pub use xdr::{decode_response, server_error_message, ArrayValues, DecodedArray};
