// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod convert;
pub mod email;
pub mod leads;

pub use convert::{ConversionEngine, ConversionError, DocumentConverter, SofficeEngine};
pub use email::{EmailError, MailTransport, Mailer, OutboundEmail};
pub use leads::LeadService;
