//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
//! Password hashing is CPU-bound, which is why the auth API runs it on the blocking thread pool.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use storefront_engine::{
    db_types::{CartItemId, NewProduct, OrderId, ProductId, ProductUpdate, Role},
    payment_objects::ChargeRequest,
    traits::{
        CartManagement,
        CatalogManagement,
        OrderManagement,
        PageParams,
        Pagination,
        ProductQueryFilter,
        UserManagement,
    },
    AuthApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    PaymentApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{
        AddToCartRequest,
        JsonResponse,
        LoginRequest,
        PlaceOrderRequest,
        ProductSearchParams,
        RegisterRequest,
        StatusUpdateRequest,
        UserProfile,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            pub const METHOD: actix_web::http::Method = actix_web::http::Method::[<$method:upper>];
            pub const PATH: &'static str = $path;

            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            pub const METHOD: actix_web::http::Method = actix_web::http::Method::[<$method:upper>];
            pub const PATH: &'static str = $path;

            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl UserManagement);
/// Route handler for account registration
///
/// Creates a new account and returns its profile. Accounts are created with the `user` role, unless the email
/// address is one of the configured admin addresses.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    trace!("💻️ Received registration request");
    let role = if options.is_admin_email(&req.email) { Role::Admin } else { Role::User };
    let user = api.register(&req.email, &req.password, &req.full_name, role).await.map_err(|e| {
        debug!("💻️ Could not register account. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(UserProfile::from(user)))
}

route!(login => Post "/auth/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// Checks the user's credentials and issues a JWT access token that must be supplied as a bearer token in the
/// `Authorization` header of every authenticated request. The token is valid for a fixed period and will NOT refresh.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    trace!("💻️ Received login request");
    let user = api.login(&req.email, &req.password).await?;
    let token = signer.issue_token(&user)?;
    info!("💻️ Issued access token for {}", user.id);
    Ok(HttpResponse::Ok().json(token))
}

route!(me => Get "/me" impl UserManagement);
pub async fn me<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for {}", claims.sub);
    let user = api.user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
/// Route handler for the product listing
///
/// Query parameters (all optional):
/// * `q` - case-insensitive text matched against product names and descriptions,
/// * `min_price`, `max_price` - inclusive price bounds in minor units,
/// * `sort` - one of `price_asc`, `price_desc`, `name_asc`, `name_desc`, `created_desc` (the default),
/// * `page`, `size` - pagination. Out-of-range values are clamped.
pub async fn products<B: CatalogManagement>(
    query: web::Query<ProductSearchParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = ProductQueryFilter::try_from(query.into_inner())?;
    debug!("💻️ GET products with {filter:?}");
    let page = api.search(filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(product_by_id => Get "/products/{id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    debug!("💻️ GET product {id}");
    let product = api.product(id).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(add_to_cart => Post "/cart" impl CartManagement);
/// Route handler for adding products to the cart
///
/// If the product is already in the cart, its quantity is replaced by the requested quantity. The response is the
/// updated cart.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddToCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST cart for {}: {} x {}", claims.sub, req.quantity, req.product_id);
    let cart = api.add_item(claims.sub, req.product_id, req.quantity).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(get_cart => Get "/cart" impl CartManagement);
pub async fn get_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for {}", claims.sub);
    let cart = api.cart(claims.sub).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_cart_item => Delete "/cart/{item_id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = CartItemId::from(path.into_inner());
    debug!("💻️ DELETE {item_id} for {}", claims.sub);
    api.remove_item(claims.sub, item_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Item removed from cart")))
}

route!(clear_cart => Delete "/cart" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for {}", claims.sub);
    let count = api.clear(claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Removed {count} items from the cart"))))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl OrderManagement, CartManagement);
/// Route handler for placing an order
///
/// Everything in the caller's cart is converted into a single order. Stock is reserved and the cart is cleared in the
/// same transaction, so either the whole order is placed or nothing changes.
pub async fn place_order<B: OrderManagement + CartManagement>(
    claims: JwtClaims,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST order for {}", claims.sub);
    let req = body.into_inner();
    let order = api.place_order(claims.sub, req.shipping_address).await.map_err(|e| {
        if e.is_client_error() {
            debug!("💻️ Order for {} was refused. {e}", claims.sub);
        }
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl OrderManagement);
/// Route handler for the orders endpoint
///
/// Authenticated users can fetch their own orders, newest first, using this endpoint. Admins use `/admin/orders` to
/// see everyone's orders.
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    query: web::Query<PageParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pagination = Pagination::from(query.into_inner());
    debug!("💻️ GET my_orders for {} ({pagination:?})", claims.sub);
    let orders = api.orders_for_user(claims.sub, pagination).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_order => Get "/orders/{order_id}" impl OrderManagement);
pub async fn my_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET {order_id} for {}", claims.sub);
    let order = api.order_for_user(order_id, claims.sub).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(charge => Post "/payments/charge" impl OrderManagement);
/// Route handler for paying for an order
///
/// A declined charge is still a successful request: the response carries a `failed` status and the order is left
/// untouched so that the user can try again.
pub async fn charge<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<ChargeRequest>,
    api: web::Data<PaymentApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST charge for {} by {}", req.order_id, claims.sub);
    let result = api.charge(claims.sub, req).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(admin_orders => Get "/admin/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn admin_orders<B: OrderManagement>(
    query: web::Query<PageParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pagination = Pagination::from(query.into_inner());
    debug!("💻️ GET all orders ({pagination:?})");
    let orders = api.all_orders(pagination).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(admin_order => Get "/admin/orders/{order_id}" impl OrderManagement where requires [Role::Admin]);
pub async fn admin_order<B: OrderManagement>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET admin view of {order_id}");
    let order = api.order_by_id(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Patch "/admin/orders/{order_id}" impl OrderManagement where requires [Role::Admin]);
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let req = body.into_inner();
    info!("💻️ {} is setting the status of {order_id} to {}", claims.sub, req.status);
    let order = api.update_order_status(order_id, &req.status).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(create_product => Post "/admin/products" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_product<B: CatalogManagement>(
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.create_product(body.into_inner()).await?;
    info!("💻️ Created {} ({})", product.id, product.sku);
    Ok(HttpResponse::Created().json(product))
}

route!(import_products => Post "/admin/products/bulk" impl CatalogManagement where requires [Role::Admin]);
/// Route handler for bulk product imports
///
/// The import is all-or-nothing. If any product is invalid, or any SKU is already taken, no product is created.
pub async fn import_products<B: CatalogManagement>(
    body: web::Json<Vec<NewProduct>>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = body.into_inner();
    debug!("💻️ POST bulk import of {} products", products.len());
    let products = api.import_products(products).await?;
    Ok(HttpResponse::Created().json(products))
}

route!(update_product => Put "/admin/products/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_product<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    debug!("💻️ PUT {id}");
    let product = api.update_product(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/admin/products/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_product<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    api.delete_product(id).await?;
    info!("💻️ Deleted {id}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Deleted {id}"))))
}
