//! Active-record model layer for SQL databases.
//!
//! A model is a plain struct declared with [`entity!`] plus a [`Model`] implementation
//! naming its table and, optionally, how caller parameters narrow its select query.
//! [`ModelOperations`] provides the shared select, insert, update, upsert and delete
//! logic; SQL is generated with ``SeaQuery`` and executed through a [`Provider`].
//!
//! # Quick Start
//!
//! ## Define a Model
//!
//! ```ignore
//! use std::sync::LazyLock;
//!
//! use webapp_model::{Filter, Model, ModelDescriptor, ModelParams, SelectBuilder, entity};
//!
//! entity! {
//!     #[derive(Debug, Clone, Default)]
//!     pub struct Post {
//!         pub id: i64,
//!         pub title: String,
//!         pub published: bool,
//!     }
//! }
//!
//! impl Model for Post {
//!     fn descriptor() -> &'static ModelDescriptor {
//!         static DESCRIPTOR: LazyLock<ModelDescriptor> = LazyLock::new(|| {
//!             ModelDescriptor::new("blog", "posts").with_alias("p").with_primary_key_names(["id"])
//!         });
//!         &DESCRIPTOR
//!     }
//!
//!     fn build_select_query(
//!         mut query: SelectBuilder<Self>, params: &mut ModelParams,
//!     ) -> webapp_model::Result<SelectBuilder<Self>> {
//!         if params.exists("published") {
//!             if let Some(published) = params.get_as::<bool>("published")? {
//!                 query = query.r#where(Filter::eq("published", published));
//!             }
//!         }
//!         Ok(query)
//!     }
//! }
//! ```
//!
//! ## CRUD Operations
//!
//! ```ignore
//! let provider = SqliteProvider::connect_with(ConnectOptions::load()?)?;
//!
//! // every param must be consumed, either by the model or as a well-known key
//! let posts = Post::get_rows(&provider, params! {
//!     "published" => true,
//!     "@orderBy" => "-id",
//!     "@page" => 2,
//!     "@pageSize" => 20,
//! })?;
//!
//! // generated ids are written back to the primary key
//! let mut post = Post { title: "Hello".to_string(), ..Post::default() };
//! post.insert(&provider, &[])?;
//!
//! post.published = true;
//! post.update(&provider, &[], &["published"])?;
//!
//! Post::delete(&provider, params! { "id" => post.id })?;
//! ```
//!
//! ## Filtering
//!
//! ```ignore
//! Filter::eq("status", "active")
//! Filter::gt("views", 1000)
//! Filter::like("title", "%rust%")
//! Filter::r#in("id", vec![1, 2, 3])
//!
//! Filter::Or(vec![
//!     Filter::eq("featured", true),
//!     Filter::gt("views", 5000),
//! ])
//!
//! // table-qualified, for joins
//! Filter::table_eq("users", "active", true)
//! Filter::col_eq("p", "author_id", "users", "id")
//! ```

mod connection;
mod delete;
mod descriptor;
mod entity;
mod error;
mod filter;
mod insert;
mod join;
mod model;
mod operations;
mod params;
mod query;
mod result;
mod select;
mod sqlite;
mod types;
mod update;
mod upsert;

pub use connection::{Connection, Execution, Provider};
pub use delete::DeleteBuilder;
pub use descriptor::ModelDescriptor;
pub use entity::{Entity, EntityValues, FetchValue};
pub use error::{ModelError, Result};
pub use filter::Filter;
pub use insert::InsertBuilder;
pub use join::Join;
pub use model::Model;
pub use operations::ModelOperations;
pub use params::{ModelParams, Params};
pub use query::Query;
pub use result::{DeleteResult, InsertResult, UpdateResult, UpsertInsert, UpsertResult};
pub use select::{OrderSpec, SelectBuilder};
pub use sqlite::{ConnectOptions, SqliteProvider};
pub use types::{DataType, Field, Row};
pub use update::UpdateBuilder;
pub use upsert::UpsertBuilder;

// Re-exports for ``entity`` and ``params`` macro use only. This is needed to avoid
// leaking ``SeaQuery`` value types into model code
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
    pub use sea_query::Value;
    pub use serde_json::json;
}
