//! Adapts an axum [`WebSocket`] into a transport-agnostic [`Connection`].

use axum::extract::ws::{Message, WebSocket};
use futures_util::future;
use futures_util::{SinkExt, StreamExt};

use crate::domain::{Connection, Frame};
use crate::error::HubError;

/// Splits `socket` and wraps both halves.
///
/// Text and binary frames are passed through; control frames are handled
/// by the WebSocket layer itself. A close frame ends the read half.
pub fn into_connection(socket: WebSocket) -> Connection {
    let (ws_tx, ws_rx) = socket.split();

    let sink = ws_tx
        .sink_map_err(HubError::from)
        .with(|frame: Frame| future::ready(Ok::<_, HubError>(to_message(frame))));

    let stream = ws_rx
        .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
        .filter_map(|msg| future::ready(from_message(msg)));

    Connection::new(sink, stream)
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::text(text),
        Frame::Binary(bytes) => Message::binary(bytes),
    }
}

fn from_message(msg: Result<Message, axum::Error>) -> Option<Result<Frame, HubError>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Binary(bytes)) => Some(Ok(Frame::Binary(bytes.to_vec()))),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
        Err(e) => Some(Err(e.into())),
    }
}
