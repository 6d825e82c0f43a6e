//! A small actix-web-hosted JSON-RPC dispatcher, grounded on the teacher's
//! `RPCHandler<T>` / `json_rpc` endpoint pair in `tos_common::rpc::server`:
//! one HTTP POST endpoint, a method-name-keyed handler table, a shared
//! context value cloned into every call.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actix_web::web::{Bytes, Data};
use actix_web::{HttpResponse, Responder};
use serde_json::Value;

use super::error::{RpcError, RpcResponseError};
use super::types::{RpcRequest, RpcSuccess};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send>>;
type Handler<Ctx> = Arc<dyn Fn(Ctx, Value) -> HandlerFuture + Send + Sync>;

/// Method-name-keyed dispatch table, generic over the context type each
/// handler receives (e.g. `Arc<Ledger>` for the bank, `Arc<Coordinator>`
/// for the coordinator).
pub struct RpcHandler<Ctx: Clone + Send + Sync + 'static> {
    context: Ctx,
    methods: HashMap<&'static str, Handler<Ctx>>,
}

impl<Ctx: Clone + Send + Sync + 'static> RpcHandler<Ctx> {
    pub fn new(context: Ctx) -> Self {
        Self {
            context,
            methods: HashMap::new(),
        }
    }

    /// Register a method. `f` takes the shared context and the raw params
    /// value and returns the raw result value, serialized by the caller.
    pub fn method<F, Fut>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(Ctx, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        self.methods
            .insert(name, Arc::new(move |ctx, params| Box::pin(f(ctx, params))));
        self
    }

    pub async fn dispatch(&self, request: RpcRequest) -> Result<Value, RpcResponseError> {
        let handler = self.methods.get(request.method.as_str()).ok_or_else(|| {
            RpcResponseError::new(
                request.id.clone(),
                RpcError::MethodNotFound(request.method.clone()),
            )
        })?;

        handler(self.context.clone(), request.params)
            .await
            .map_err(|e| RpcResponseError::new(request.id.clone(), e))
    }
}

/// The single HTTP endpoint every gateway server (bank, coordinator)
/// mounts at `POST /json_rpc`.
pub async fn json_rpc<Ctx: Clone + Send + Sync + 'static>(
    handler: Data<RpcHandler<Ctx>>,
    body: Bytes,
) -> Result<impl Responder, RpcResponseError> {
    let request: RpcRequest = serde_json::from_slice(&body)
        .map_err(|_| RpcResponseError::new(None, RpcError::InvalidJsonRequest))?;
    let id = request.id.clone();
    let result = handler.dispatch(request).await?;
    Ok(HttpResponse::Ok().json(RpcSuccess::new(id, result)))
}
