use std::time::Duration;

use actix_web::{
    dev::{ResourceDef, Server},
    error::{JsonPayloadError, QueryPayloadError},
    guard,
    guard::Guard,
    http::{KeepAlive, Method},
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpResponse,
    HttpServer,
    Scope,
};
use log::*;
use storefront_engine::{
    AuthApi,
    CartApi,
    CartManagement,
    CatalogApi,
    CatalogManagement,
    OrderFlowApi,
    OrderManagement,
    PaymentApi,
    SqliteDatabase,
    UserManagement,
};

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddToCartRoute,
        AdminOrderRoute,
        AdminOrdersRoute,
        ChargeRoute,
        ClearCartRoute,
        CreateProductRoute,
        DeleteProductRoute,
        GetCartRoute,
        ImportProductsRoute,
        LoginRoute,
        MeRoute,
        MyOrderRoute,
        MyOrdersRoute,
        PlaceOrderRoute,
        ProductByIdRoute,
        ProductsRoute,
        RegisterRoute,
        RemoveCartItemRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
        info!("🗃️ Database migrations are up to date");
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let verifier = TokenVerifier::new(&config.auth);
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let catalog_api = CatalogApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone());
        let payment_api = PaymentApi::with_success_rate(db.clone(), config.payment_success_rate);
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("storefront::access_log"))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .service(health)
            .service(api_scope::<SqliteDatabase>(verifier.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

pub const API_PREFIX: &str = "/api/v1";

/// Builds the `/api/v1` scope. Routes that need a logged-in user sit in a nested scope behind the access token
/// middleware. Requests that match no route get a 404, with or without a token.
pub fn api_scope<B>(verifier: TokenVerifier) -> Scope
where B: UserManagement + CatalogManagement + CartManagement + OrderManagement + 'static {
    let protected = [
        (MeRoute::<B>::METHOD, MeRoute::<B>::PATH),
        (AddToCartRoute::<B>::METHOD, AddToCartRoute::<B>::PATH),
        (GetCartRoute::<B>::METHOD, GetCartRoute::<B>::PATH),
        (ClearCartRoute::<B>::METHOD, ClearCartRoute::<B>::PATH),
        (RemoveCartItemRoute::<B>::METHOD, RemoveCartItemRoute::<B>::PATH),
        (PlaceOrderRoute::<B>::METHOD, PlaceOrderRoute::<B>::PATH),
        (MyOrdersRoute::<B>::METHOD, MyOrdersRoute::<B>::PATH),
        (MyOrderRoute::<B>::METHOD, MyOrderRoute::<B>::PATH),
        (ChargeRoute::<B>::METHOD, ChargeRoute::<B>::PATH),
        (AdminOrdersRoute::<B>::METHOD, AdminOrdersRoute::<B>::PATH),
        (AdminOrderRoute::<B>::METHOD, AdminOrderRoute::<B>::PATH),
        (UpdateOrderStatusRoute::<B>::METHOD, UpdateOrderStatusRoute::<B>::PATH),
        (CreateProductRoute::<B>::METHOD, CreateProductRoute::<B>::PATH),
        (ImportProductsRoute::<B>::METHOD, ImportProductsRoute::<B>::PATH),
        (UpdateProductRoute::<B>::METHOD, UpdateProductRoute::<B>::PATH),
        (DeleteProductRoute::<B>::METHOD, DeleteProductRoute::<B>::PATH),
    ];
    let auth_scope = web::scope("")
        .guard(route_guard(API_PREFIX, &protected))
        .wrap(JwtMiddlewareFactory::new(verifier))
        .service(MeRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(GetCartRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        .service(RemoveCartItemRoute::<B>::new())
        .service(PlaceOrderRoute::<B>::new())
        .service(MyOrdersRoute::<B>::new())
        .service(MyOrderRoute::<B>::new())
        .service(ChargeRoute::<B>::new())
        .service(AdminOrdersRoute::<B>::new())
        .service(AdminOrderRoute::<B>::new())
        .service(UpdateOrderStatusRoute::<B>::new())
        .service(CreateProductRoute::<B>::new())
        .service(ImportProductsRoute::<B>::new())
        .service(UpdateProductRoute::<B>::new())
        .service(DeleteProductRoute::<B>::new());
    web::scope(API_PREFIX)
        .service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(ProductsRoute::<B>::new())
        .service(ProductByIdRoute::<B>::new())
        .service(auth_scope)
        .default_service(web::to(no_such_route))
}

/// Matches requests for one of `routes`, by method and by path mounted under `prefix`.
fn route_guard(prefix: &str, routes: &[(Method, &str)]) -> impl Guard {
    let routes = routes
        .iter()
        .map(|(method, path)| (method.clone(), ResourceDef::new(format!("{prefix}{path}"))))
        .collect::<Vec<_>>();
    guard::fn_guard(move |ctx| {
        let head = ctx.head();
        routes.iter().any(|(method, def)| head.method == *method && def.is_match(head.uri.path()))
    })
}

async fn no_such_route(req: HttpRequest) -> Result<HttpResponse, ServerError> {
    debug!("💻️ No route for {} {}", req.method(), req.path());
    Err(ServerError::NoRecordFound(format!("There is no endpoint at {} {}", req.method(), req.path())))
}

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not read the request body for {}. {err}", req.path());
    ServerError::InvalidRequestBody(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Could not read the query for {}. {err}", req.path());
    ServerError::InvalidQuery(err.to_string()).into()
}
