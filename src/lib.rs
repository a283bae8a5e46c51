//! # Alpacalite
//!
//! `alpacalite` is the HTTP side of an [ASCOM Alpaca](https://ascom-standards.org/api/) device
//! server, aimed at `no_std` and `no_alloc` targets such as microcontrollers driving a W5500
//! style Ethernet chip.
//!
//! This crate provides:
//!
//! * an incremental decoder for Alpaca requests, which works from a receive buffer of a few
//!   dozen bytes, and never needs the whole request in memory.
//! * a non-blocking state machine for each hardware TCP socket, which reports connects, input,
//!   half closes and disconnects, and closes sockets whose peer never finishes closing.
//! * the glue joining the two, so a main loop only has to call [`server::AlpacaServer::perform_io`].
//!
//! This crate does **not** provide:
//!
//! * the devices themselves, or the JSON responses to their methods.
//! * UDP discovery.
//!
//! ## Basic Use
//!
//! Implement [`platform::PlatformEthernet`] for the Ethernet chip, [`platform::Clock`] for a
//! millisecond timer, and [`request_listener::RequestListener`] to respond to the decoded
//! requests. Pass all three to an [`server::AlpacaServer`], call `initialize` once, then call
//! `perform_io` from the main loop.
//!
//! ## Example
//!
//! ```
//! use alpacalite::alpaca_request::AlpacaRequest;
//! use alpacalite::config::{ALPACA_HTTP_PORT, DecoderConfig, ServerSocketConfig};
//! use alpacalite::connection::Connection;
//! use alpacalite::platform::{Clock, PlatformEthernet};
//! use alpacalite::request_listener::RequestListener;
//! use alpacalite::server::AlpacaServer;
//! use alpacalite::tokens::{DeviceMethod, DeviceType};
//!
//! const JSON_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n";
//!
//! struct SafetyMonitor {
//!     safe: bool,
//! }
//!
//! impl RequestListener for SafetyMonitor {
//!     fn on_request_decoded(
//!         &mut self,
//!         request: &AlpacaRequest,
//!         connection: &mut dyn Connection,
//!     ) -> bool {
//!         if request.device_type != DeviceType::SafetyMonitor
//!             || request.device_method != DeviceMethod::IsSafe
//!         {
//!             return false;
//!         }
//!         let body: &[u8] = if self.safe {
//!             b"Content-Length: 15\r\n\r\n{\"Value\": true}"
//!         } else {
//!             b"Content-Length: 16\r\n\r\n{\"Value\": false}"
//!         };
//!         connection.write(JSON_HEADER).is_ok() && connection.write(body).is_ok()
//!     }
//! }
//!
//! # struct NoEthernet;
//! #
//! # impl PlatformEthernet for NoEthernet {
//! #     fn find_unused_socket(&mut self) -> Option<u8> { None }
//! #     fn socket_status(&mut self, _: u8) -> u8 { 0 }
//! #     fn initialize_tcp_listener_socket(&mut self, _: u8, _: u16) -> bool { false }
//! #     fn is_tcp_listener(&mut self, _: u8, _: u16) -> bool { false }
//! #     fn disconnect_socket(&mut self, _: u8) {}
//! #     fn close_socket(&mut self, _: u8) {}
//! #     fn is_open_for_writing(&mut self, _: u8) -> bool { false }
//! #     fn available(&mut self, _: u8) -> usize { 0 }
//! #     fn peek(&mut self, _: u8) -> Option<u8> { None }
//! #     fn read(&mut self, _: u8, _: &mut [u8]) -> usize { 0 }
//! #     fn write(&mut self, _: u8, _: &[u8]) -> usize { 0 }
//! # }
//! #
//! # struct Millis;
//! #
//! # impl Clock for Millis {
//! #     fn now_millis(&self) -> u32 { 0 }
//! # }
//! #
//! // NoEthernet and Millis wrap the board's Ethernet chip and timer (not shown).
//! let mut server: AlpacaServer<_, _, _, 4> = AlpacaServer::new(
//!     NoEthernet,
//!     Millis,
//!     SafetyMonitor { safe: true },
//!     ServerSocketConfig::new(ALPACA_HTTP_PORT),
//!     DecoderConfig::new(),
//! );
//! if server.initialize() == 0 {
//!     // no sockets available yet, perform_io will keep trying
//! }
//! for _ in 0..3 {
//!     server.perform_io();
//! }
//! ```

#![no_std]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

mod ascii;

/// Decoded requests
pub mod alpaca_request;
/// Strings which are either literals or borrowed views
pub mod any_string;
/// Limits and settings
pub mod config;
/// Byte streams to and from a client
pub mod connection;
/// `embedded-io` adapters for connections
pub mod io;
/// Case-insensitive string constants
pub mod literal;
/// The Ethernet chip and clock
pub mod platform;
/// Incremental request decoding
pub mod request_decoder;
/// Receivers of decoded requests
pub mod request_listener;
/// HTTP status codes and error responses
pub mod response;
/// Sockets, connections and the server
pub mod server;
/// Request decoding for one connection at a time
pub mod server_connection;
/// Hardware socket state machine
pub mod server_socket;
/// Receivers of socket events
pub mod socket_listener;
/// Borrowed byte strings
pub mod string_view;
/// Keyword to value tables
pub mod token;
/// The keywords of the protocol
pub mod tokens;

#[cfg(test)]
mod test_support;
