//! # paycard
//!
//! Embeddable checkout form engine. A [`Widget`] fetches its form
//! configuration, renders it through the template language in
//! `paycard-template`, binds input masks and validators from
//! `paycard-validation`, and submits through whichever payment provider the
//! user picked.
//!
//! The engine never touches a concrete UI toolkit: the page is reached
//! through the [`Document`] and [`FieldAccessor`] traits, and the network
//! through the collaborator traits in [`backend`]. [`MemoryDocument`] is a
//! headless document for tests and non-browser hosts.
//!
//! Everything is single-threaded (`Rc`/`RefCell`); run the widget on a
//! current-thread runtime inside a `tokio::task::LocalSet`.

pub mod backend;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod error;
pub mod events;
pub mod field_validator;
pub mod mask;
pub mod memory;
pub mod policy;
pub mod provider;
pub mod select;
pub mod session;
pub mod templates;
pub mod widget;

pub use backend::{
    Collaborators, ConfigLoader, ConfigRequest, PaymentGateway, PaymentResponse, PaymentStatus,
    Payload, RegisterResponse, SubscriberRegistry,
};
pub use config::{FormConfig, SubscriberIdType, WidgetConfig};
pub use dom::{Document, FieldAccessor, FieldEvent, FieldHandle, FieldKind, FocusedElement};
pub use error::{MaskError, Result, WidgetError};
pub use events::WidgetEvents;
pub use mask::{InputMask, MaskSpec, MaskedField};
pub use memory::{MemoryDocument, MemoryField};
pub use policy::RequirementContext;
pub use provider::{detect_active_provider, ProviderKey};
pub use session::{FormSession, FormValidation};
pub use templates::TemplateSet;
pub use widget::{RenderState, SubmitOutcome, Widget, WidgetState};
