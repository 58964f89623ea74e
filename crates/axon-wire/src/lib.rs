//! # axon-wire
//!
//! P2P wire protocol for the Axon network.
//!
//! This crate provides:
//! - The closed frame set (requests 0–24, responses 239–254)
//! - A bijective frame codec: `decode(encode(f)) = (f, ∅)` for every
//!   constructible frame, `encode ∘ decode ∘ encode = encode` over wires
//! - Length-prefixed stream framing for TCP
//! - The dispatcher mapping each request to its fixed response kind
//! - The per-connection service loop

pub mod codec;
mod dispatch;
mod error;
mod frame;
mod service;
mod stream;

pub use codec::{decode, encode};
pub use dispatch::{process, Clock, HandlerContext, MiningCoordinator, ReplicationPipeline};
pub use error::{WireError, WireResult};
pub use frame::{ErrorReason, Frame, ReplicationRoles, ReplicationTree, Request, Response};
pub use service::{NetworkService, ServiceConfig};
pub use stream::{FrameCodec, DEFAULT_MAX_FRAME_SIZE};

/// Default P2P port.
pub const DEFAULT_PORT: u16 = 3002;
