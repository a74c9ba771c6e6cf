//! Discord interface for the anime search bot
//!
//! - **Commands** (`commands`) - the `/ai query:<text>` surface and its parsing
//! - **Dispatch** (`dispatch`) - gate, acknowledge, search, format, deliver
//! - **Gateway** (`gateway`) - serenity session feeding invocations to the dispatcher
//!
//! # Architecture
//!
//! ```text
//! Discord gateway → GatewayHandler → mpsc<Invocation> → CommandDispatcher
//!                                                          ↓
//!                         AuthorizationGate → QueryExecutor → ResponseFormatter
//! ```
//!
//! The dispatcher only sees [`dispatch::Invocation`] values and the
//! [`dispatch::InteractionResponder`] trait, so the pipeline is tested
//! without a live session.

pub mod commands;
pub mod dispatch;
pub mod gateway;
