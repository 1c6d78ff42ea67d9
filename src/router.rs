use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, elevated, protected, public};
use crate::middleware::{require_admin, require_auth};
use crate::state::AppState;

/// Full HTTP surface with gates applied per path prefix
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(public::health))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes(&state))
        .nest("/orders", order_routes(&state))
        .nest("/admin", admin_routes(&state))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http());

    if state.config().security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

fn product_routes(state: &AppState) -> Router<AppState> {
    use public::products;

    // Reads are always public; writes are public unless configured otherwise
    let writes = |route: MethodRouter<AppState>| {
        if state.config().catalog.require_admin_for_writes {
            route
                .route_layer(from_fn(require_admin))
                .route_layer(from_fn_with_state(state.clone(), require_auth))
        } else {
            route
        }
    };

    Router::new()
        .route(
            "/",
            get(products::list_products).merge(writes(post(products::create_product))),
        )
        .route(
            "/:id",
            get(products::get_product).merge(writes(
                put(products::update_product).delete(products::delete_product),
            )),
        )
}

fn order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(protected::create_order))
        .route("/my", get(protected::my_orders))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    // Layers run outermost-last: require_auth first, then require_admin
    Router::new()
        .route("/users", get(elevated::list_users))
        .route("/users/:id/role", patch(elevated::set_user_role))
        .route("/orders", get(elevated::list_orders))
        .route("/stats", get(elevated::stats))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}
