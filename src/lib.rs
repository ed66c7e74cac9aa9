//! Geometry and interaction engine for the Card Map diagram editor.
//!
//! The editor shows cards (content nodes) and rails (linear guides) on a
//! pannable, zoomable canvas, and lets users connect them with lines. This
//! crate owns every decision behind that: converting pointer positions into
//! world coordinates, picking the anchors a connection attaches to, snapping
//! dragged cards onto rails, enforcing the one-connection-per-pair rule, and
//! aligning or distributing a selection. Drawing the connector curves and
//! storing the map are left to the host, which plugs in through the
//! [`connector::Connector`] and [`store::MapStore`] traits.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EditorSession`]: owns all editor state and handles input |
//! | [`doc`] | Cards, rails, connections, anchors and the serializable map document |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`bounds`] | Bounding boxes and the [`bounds::BoundsProvider`] capability |
//! | [`anchor`] | Connection anchor resolution |
//! | [`snap`] | Rail snapping and rail resizing |
//! | [`connections`] | The connection registry and its pending-delete set |
//! | [`selection`] | Selection set, align and distribute |
//! | [`connector`] | The external connector-drawing capability |
//! | [`hit`] | Hit-testing against cards, rails and rail handles |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`config`] | Editor settings with lenient coercion |
//! | [`store`] | Persistence boundary and bundled stores |
//! | [`ids`] | Id generation |
//! | [`consts`] | Shared numeric constants (zoom limits, snap offsets, sizes) |

pub mod anchor;
pub mod bounds;
pub mod camera;
pub mod config;
pub mod connections;
pub mod connector;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod ids;
pub mod input;
pub mod selection;
pub mod snap;
pub mod store;
