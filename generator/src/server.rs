use std::{io, sync::Arc};

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::draw::PensionCode;
use crate::http::{HttpCodec, HttpError, Method, Request, Response};
use crate::protocol::{self, Envelope};
use crate::service::Service;

pub const API_BASE: &str = "/api";

fn envelope_response<T: serde::Serialize>(status: u16, envelope: &Envelope<T>) -> Response {
    let mut body = Vec::with_capacity(128);
    protocol::write_envelope(&mut body, envelope);
    Response::json(status, body)
}

fn failure(status: u16, message: &str) -> Response {
    envelope_response(status, &Envelope::<u8>::failure(message))
}

/// Maps one request to its response.
pub async fn route(service: &Service, request: &Request) -> Response {
    let endpoint = request.path.strip_prefix(API_BASE).and_then(|p| p.strip_prefix('/'));

    let response = match (&request.method, endpoint) {
        (Method::Options, _) => Response::empty(204),
        (Method::Get, Some("generate-lotto")) => match service.lotto().await {
            Ok(set) => envelope_response(200, &protocol::lotto_ok(set)),
            Err(e) => {
                error!("Lotto draw failed: {}", e);
                failure(500, protocol::LOTTO_FAILED)
            }
        },
        (Method::Get, Some("generate-pension")) => {
            let code: PensionCode = service.pension();
            envelope_response(200, &protocol::pension_ok(code))
        }
        (Method::Get, _) => failure(404, protocol::NOT_FOUND),
        (Method::Other(method), _) => {
            debug!("Rejecting {} {}", method, request.path);
            failure(405, protocol::METHOD_NOT_ALLOWED)
        }
    };

    if request.keep_alive {
        response
    } else {
        response.closing()
    }
}

async fn handle_conn(stream: TcpStream, service: &Service) -> Result<(), HttpError> {
    let mut framed = Framed::new(stream, HttpCodec);

    while let Some(item) = framed.next().await {
        match item {
            Ok(request) => {
                debug!("{:?} {}", request.method, request.path);
                let response = route(service, &request).await;
                let close = response.close;
                framed.send(response).await?;
                if close {
                    break;
                }
            }
            Err(HttpError::Io(e)) => return Err(HttpError::Io(e)),
            Err(e) => {
                framed
                    .send(failure(400, protocol::BAD_REQUEST).closing())
                    .await?;
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Accepts connections forever, one task per connection.
pub async fn serve(listener: TcpListener, service: Arc<Service>) -> io::Result<()> {
    info!(
        "Serving {} draws on {}",
        if service.recommends() { "recommended" } else { "uniform" },
        listener.local_addr()?
    );

    loop {
        let (socket, addr) = listener.accept().await?;
        debug!("New connection from: {}", addr);

        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = handle_conn(socket, &service).await {
                warn!("Connection {} ended with error: {}", addr, e);
            }
            debug!("Connection closed: {}", addr);
        });
    }
}
