#[path = "helpers/mod.rs"]
mod helpers;

#[path = "hir/mod.rs"]
mod hir;

#[path = "project/mod.rs"]
mod project;

#[path = "codegen/mod.rs"]
mod codegen;

#[path = "driver/mod.rs"]
mod driver;
