pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_db::Db;
use shelf_kernel::{InitCtx, Migration, Module};

/// Route prefix and registry name
pub const MODULE_NAME: &str = "book";

/// Books module: CRUD over books and their author reference
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let mut conn = ctx.db.pool().acquire().await?;
        let books = repository::count(&mut *conn).await?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router<Db> {
        routes::router()
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
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
        let input = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookInput" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "List of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": error("Internal server error")
                        }
                    }
                },
                "": {
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": input.clone(),
                        "responses": {
                            "201": {
                                "description": "Book created; Location points at it",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": invalid.clone()
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": {
                                "description": "Book with its author",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": error("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Update the fields present in the body",
                        "tags": ["Books"],
                        "parameters": id_param.clone(),
                        "requestBody": input,
                        "responses": {
                            "204": { "description": "Book updated" },
                            "400": invalid,
                            "404": error("Book not found")
                        }
                    }
                },
                "/{id}/delete": {
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "404": error("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "coverText": { "type": "string", "nullable": true },
                            "author": {
                                "allOf": [{ "$ref": "#/components/schemas/AuthorSummary" }],
                                "nullable": true
                            }
                        },
                        "required": ["id", "title", "coverText", "author"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "maxLength": 255 },
                            "coverText": { "type": "string", "maxLength": 2000, "nullable": true },
                            "idAuthor": { "type": "integer", "format": "int64" }
                        }
                    },
                    "BookSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "coverText": { "type": "string", "nullable": true }
                        },
                        "required": ["id", "title", "coverText"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    title      TEXT NOT NULL,
                    cover_text TEXT,
                    author_id  INTEGER REFERENCES authors (id) ON DELETE CASCADE
                );
                CREATE INDEX books_author_id ON books (author_id);
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
