//! Notes REST API
//!
//! CRUD over NoteService plus the mirror consistency report. Reads come from
//! the table only; mutations return a `mirrorWarning` when the table write
//! succeeded but the mirror file could not be updated.

use actix_web::{web, HttpResponse, Responder};
use notes_types::{CreateNoteRequest, DeleteNoteResponse, NoteResponse, UpdateNoteRequest};

use crate::error::NoteError;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    );
    cfg.service(web::resource("/api/notes/mirror/status").route(web::get().to(mirror_status)));
    cfg.service(
        web::resource("/api/notes/{id}")
            .route(web::get().to(get_note))
            .route(web::put().to(update_note))
            .route(web::delete().to(delete_note)),
    );
}

/// NotFound maps to 404; everything else is a generic 500 with details in the log
fn error_response(action: &str, e: &NoteError) -> HttpResponse {
    match e {
        NoteError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Note not found"
        })),
        _ => {
            log::error!("Failed to {}: {}", action, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// List all notes, most recently updated first
async fn list_notes(data: web::Data<AppState>) -> impl Responder {
    match data.notes.list().await {
        Ok(notes) => HttpResponse::Ok().json(notes),
        Err(e) => error_response("list notes", &e),
    }
}

async fn get_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match data.notes.get(&id).await {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(e) => error_response("get note", &e),
    }
}

async fn create_note(
    data: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> impl Responder {
    let req = body.into_inner();

    match data.notes.create(&req.title, &req.body).await {
        Ok(outcome) => {
            let mirror_warning = outcome.warning_message();
            HttpResponse::Created().json(NoteResponse {
                note: outcome.value,
                mirror_warning,
            })
        }
        Err(e) => error_response("create note", &e),
    }
}

async fn update_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let req = body.into_inner();

    match data.notes.update(&id, &req.title, &req.body).await {
        Ok(outcome) => {
            let mirror_warning = outcome.warning_message();
            HttpResponse::Ok().json(NoteResponse {
                note: outcome.value,
                mirror_warning,
            })
        }
        Err(e) => error_response("update note", &e),
    }
}

async fn delete_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();

    match data.notes.delete(&id).await {
        Ok(outcome) => HttpResponse::Ok().json(DeleteNoteResponse {
            success: true,
            mirror_warning: outcome.warning_message(),
        }),
        Err(e) => error_response("delete note", &e),
    }
}

/// Table vs. mirror drift report (diagnostic only, nothing is repaired)
async fn mirror_status(data: web::Data<AppState>) -> impl Responder {
    match data.notes.audit().await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => error_response("audit mirror", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StoreBackend};
    use crate::db::MemoryNoteStore;
    use crate::mirror::testing::BrokenMirror;
    use crate::mirror::{FileMirror, FsMirror};
    use crate::service::NoteService;
    use actix_web::{http::StatusCode, test, App};
    use notes_types::{MirrorStatus, Note};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn state_in(dir: &std::path::Path) -> web::Data<AppState> {
        state_with_mirror(dir, Arc::new(FsMirror::new(dir.join("notes"))))
    }

    fn state_with_mirror(dir: &std::path::Path, mirror: Arc<dyn FileMirror>) -> web::Data<AppState> {
        let notes = NoteService::new(Arc::new(MemoryNoteStore::new()), mirror);
        web::Data::new(AppState {
            notes: Arc::new(notes),
            config: Config {
                port: 0,
                database_url: String::new(),
                notes_dir: dir.join("notes"),
                store_backend: StoreBackend::Memory,
            },
            started_at: std::time::Instant::now(),
        })
    }

    #[actix_web::test]
    async fn test_note_lifecycle_over_http() {
        let dir = tempdir().unwrap();
        let app = test::init_service(App::new().app_data(state_in(dir.path())).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/notes")
            .set_json(CreateNoteRequest {
                title: "Meeting Notes".to_string(),
                body: "Agenda: ...".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: NoteResponse = test::read_body_json(resp).await;
        assert!(created.mirror_warning.is_none());
        let id = created.note.id.clone();

        let req = test::TestRequest::get().uri(&format!("/api/notes/{}", id)).to_request();
        let fetched: Note = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched.body, "Agenda: ...");

        let req = test::TestRequest::put()
            .uri(&format!("/api/notes/{}", id))
            .set_json(UpdateNoteRequest {
                title: "Meeting Notes".to_string(),
                body: "Agenda: revised".to_string(),
            })
            .to_request();
        let updated: NoteResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated.note.body, "Agenda: revised");

        let req = test::TestRequest::get().uri("/api/notes").to_request();
        let all: Vec<Note> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 1);

        let req = test::TestRequest::get().uri("/api/notes/mirror/status").to_request();
        let status: MirrorStatus = test::call_and_read_body_json(&app, req).await;
        assert!(status.is_consistent());

        let req = test::TestRequest::delete().uri(&format!("/api/notes/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/api/notes/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(!dir.path().join("notes").join(format!("{}.md", id)).exists());
    }

    #[actix_web::test]
    async fn test_missing_note_is_404() {
        let dir = tempdir().unwrap();
        let app = test::init_service(App::new().app_data(state_in(dir.path())).configure(config)).await;

        let req = test::TestRequest::put()
            .uri("/api/notes/ghost")
            .set_json(UpdateNoteRequest {
                title: "t".to_string(),
                body: "b".to_string(),
            })
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/api/notes/ghost").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_store_failure_is_generic_500() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path());
        state.notes.store().drop_table().await.unwrap();
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/notes").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_mirror_failure_is_reported_as_warning() {
        let dir = tempdir().unwrap();
        let state = state_with_mirror(dir.path(), Arc::new(BrokenMirror));
        let app = test::init_service(App::new().app_data(state).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/notes")
            .set_json(CreateNoteRequest {
                title: "t".to_string(),
                body: "b".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["mirrorWarning"].as_str().unwrap().contains("disk full"));
        let id = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/notes/{}", id))
            .set_json(UpdateNoteRequest {
                title: "t".to_string(),
                body: "b2".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["body"], "b2");
        assert!(body["mirrorWarning"].is_string());

        let req = test::TestRequest::delete().uri(&format!("/api/notes/{}", id)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert!(body["mirrorWarning"].as_str().unwrap().contains("read-only"));
    }
}
