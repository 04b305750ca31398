//! Scene management and compositing core for phone Wayland shells.
//!
//! [`scene::Scene`] owns outputs, views, layer surfaces and seats. Protocol handlers feed it
//! client state, input code queries it with [`scene::Scene::contents_under`], and the output
//! backend drives [`scene::Scene::render_output`] once per refresh.

#[macro_use]
extern crate tracing;

pub mod scene;
pub mod utils;
pub mod window;
