//! Router assembly.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    auth, departments, health, notifications, planning, reports, targets, tasks, trades, users,
};
use crate::state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/profile", get(auth::profile).put(auth::update_profile))
        .route("/change-password", post(auth::change_password))
        .route("/my-department", get(departments::my_department))
        .route("/departments", get(departments::list).post(departments::create))
        .route(
            "/departments/{id}",
            get(departments::get).put(departments::update),
        )
        .route(
            "/departments/{id}/permissions",
            get(departments::permissions).post(departments::set_permissions),
        )
        .route(
            "/departments/{id}/users",
            get(departments::members).post(departments::add_member),
        )
        .route(
            "/departments/{id}/users/{user_id}",
            delete(departments::remove_member),
        );

    let api_routes = Router::new()
        // Planning
        .route(
            "/planning/today",
            get(planning::today).post(planning::save_today),
        )
        .route("/planning/month", get(planning::month))
        .route("/planning/months", get(planning::months))
        .route("/planning/years", get(planning::years))
        .route(
            "/planning/day",
            get(planning::day).delete(planning::delete_day),
        )
        .route(
            "/planning/archive/departments",
            get(planning::archive_departments),
        )
        .route("/departments/simple", get(departments::simple_list))
        // Tasks
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/due-soon", get(tasks::due_soon))
        .route(
            "/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/tasks/{id}/approve", post(tasks::approve))
        .route("/tasks/{id}/deliver", post(tasks::deliver))
        .route(
            "/tasks/{id}/comments",
            get(tasks::comments).post(tasks::add_comment),
        )
        // Notifications
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        // Targets
        .route("/targets", get(targets::list).post(targets::create))
        .route("/targets/bulk-create", post(targets::bulk_create))
        .route(
            "/targets/{id}",
            put(targets::update).delete(targets::delete),
        )
        .route(
            "/targets/representative/{id}",
            get(targets::representative_targets),
        )
        // Sales and returns
        .route("/sales", get(trades::list_sales).post(trades::create_sale))
        .route("/sales/recent", get(trades::recent_sales))
        .route(
            "/returns",
            get(trades::list_returns).post(trades::create_return),
        )
        .route("/returns/recent", get(trades::recent_returns))
        // Reports
        .route("/reports/summary", get(reports::summary))
        .route("/reports/representatives", get(reports::representatives))
        // User administration
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            put(users::update).delete(users::soft_delete),
        )
        .route("/users/{id}/hard-delete", delete(users::hard_delete))
        .route("/users/{id}/reset-password", post(users::reset_password))
        .route("/users/{id}/reassign-records", post(users::reassign_records))
        .route("/activity-logs", get(users::activity_logs));

    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
