//! Connection service.
//!
//! One task per inbound connection; within a connection, frames are
//! processed strictly in arrival order. Codec errors are fatal for the
//! offending frame only (the stream layer keeps the connection aligned);
//! handler failures are programming errors and drop the connection.

use crate::dispatch::{process, HandlerContext};
use crate::frame::{ErrorReason, Frame, Response};
use crate::stream::FrameCodec;
use crate::WireError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, instrument, warn};

/// Network service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// P2P listen address.
    pub listen_addr: SocketAddr,
    /// Cap on a single datagram.
    pub max_frame_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3002".parse().expect("valid default address"),
            max_frame_size: crate::stream::DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// TCP accept loop feeding the dispatcher.
pub struct NetworkService {
    config: ServiceConfig,
    ctx: HandlerContext,
}

impl NetworkService {
    /// Build a service over the collaborator bundle.
    pub fn new(config: ServiceConfig, ctx: HandlerContext) -> Self {
        Self { config, ctx }
    }

    /// Run the accept loop until the listener fails.
    pub async fn run(self) -> Result<(), WireError> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "P2P service listening");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let ctx = self.ctx.clone();
                    let max_frame_size = self.config.max_frame_size;
                    tokio::spawn(async move {
                        handle_connection(stream, addr, ctx, max_frame_size).await;
                    });
                }
                Err(err) => {
                    error!(%err, "Accept failed");
                }
            }
        }
    }
}

#[instrument(skip(stream, ctx, max_frame_size))]
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: HandlerContext,
    max_frame_size: usize,
) {
    debug!("Peer connected");
    let mut framed = Framed::new(stream, FrameCodec::with_max_frame_size(max_frame_size));

    while let Some(next) = framed.next().await {
        match next {
            Ok(Frame::Request(request)) => match process(request, &ctx).await {
                Ok(response) => {
                    if framed.send(Frame::Response(response)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    // Internal inconsistency: never answered as success.
                    error!(%err, "Handler failure, dropping connection");
                    let _ = framed
                        .send(Frame::Response(Response::Error {
                            reason: ErrorReason::NetworkIssue,
                        }))
                        .await;
                    break;
                }
            },
            Ok(Frame::Response(_)) => {
                warn!("Unsolicited response frame, ignoring");
            }
            Err(WireError::Io(err)) => {
                debug!(%err, "Connection I/O error");
                break;
            }
            Err(WireError::MessageTooLarge { size, max }) => {
                // The oversized datagram was not consumed; the stream
                // cannot be realigned.
                warn!(size, max, "Oversized datagram, dropping connection");
                break;
            }
            Err(err) => {
                // Frame-fatal codec error; the datagram was consumed, so
                // the connection stays usable.
                warn!(%err, "Dropping malformed frame");
                if framed
                    .send(Frame::Response(Response::Error {
                        reason: ErrorReason::NetworkIssue,
                    }))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
    debug!("Peer disconnected");
}
