pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_db::Db;
use shelf_kernel::{InitCtx, Migration, Module};

/// Route prefix and registry name
pub const MODULE_NAME: &str = "author";

/// Authors module: CRUD over authors and cascade removal of their books
pub struct AuthorsModule;

impl AuthorsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let mut conn = ctx.db.pool().acquire().await?;
        let authors = repository::count(&mut *conn).await?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            authors,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router<Db> {
        routes::router()
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let not_found = json!({
            "description": "Author not found",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let invalid = json!({
            "description": "Validation failed",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ValidationErrors" }
                }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List authors with their books",
                        "tags": ["Authors"],
                        "responses": {
                            "200": {
                                "description": "List of authors",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Author" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "": {
                    "post": {
                        "summary": "Create an author",
                        "tags": ["Authors"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorInput" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Author created; Location points at it",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
                            "400": invalid.clone()
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get an author",
                        "tags": ["Authors"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": {
                                "description": "Author with books",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Author" }
                                    }
                                }
                            },
                            "404": not_found.clone()
                        }
                    },
                    "put": {
                        "summary": "Update the fields present in the body",
                        "tags": ["Authors"],
                        "parameters": id_param.clone(),
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/AuthorInput" }
                                }
                            }
                        },
                        "responses": {
                            "204": { "description": "Author updated" },
                            "400": invalid,
                            "404": not_found.clone()
                        }
                    },
                    "delete": {
                        "summary": "Delete an author and all of its books",
                        "tags": ["Authors"],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Author deleted" },
                            "404": not_found
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" },
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/BookSummary" }
                            }
                        },
                        "required": ["id", "firstName", "lastName", "books"]
                    },
                    "AuthorInput": {
                        "type": "object",
                        "properties": {
                            "firstName": { "type": "string", "minLength": 1, "maxLength": 255 },
                            "lastName": { "type": "string", "minLength": 1, "maxLength": 255 }
                        }
                    },
                    "AuthorSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "firstName": { "type": "string" },
                            "lastName": { "type": "string" }
                        },
                        "required": ["id", "firstName", "lastName"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE authors (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name  TEXT NOT NULL
                );
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module stopped");
        Ok(())
    }
}

/// Create a new instance of the authors module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new())
}
