//! RPC surface the coordinator calls (section 6.2 method table):
//! `authenticate`, `prepare_debit`/`prepare_credit`,
//! `commit_debit`/`commit_credit`, `abort_debit`/`abort_credit`,
//! `balance`, `history`. Wired onto `gateway_common::rpc::server::
//! RpcHandler`, grounded on the teacher's own handler-table wiring in
//! `tos_common::rpc::server`.

use std::sync::Arc;

use gateway_common::api::bank::{
    AbortParams, AuthenticateParams, AuthenticateResult, BalanceParams, BalanceResult,
    CommitParams, HistoryParams, HistoryResult, OkResult, PrepareParams, PrepareResult,
};
use gateway_common::rpc::error::RpcError;
use gateway_common::rpc::server::RpcHandler;
use serde_json::Value;

use crate::ledger::Ledger;

fn parse<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

pub fn build_handler(ledger: Arc<Ledger>) -> RpcHandler<Arc<Ledger>> {
    RpcHandler::new(ledger)
        .method("authenticate", |ledger, params| async move {
            let params: AuthenticateParams = parse(params)?;
            let authenticated = ledger
                .authenticate(&params.username, &params.password)
                .await
                .unwrap_or(false);
            Ok(serde_json::to_value(AuthenticateResult { authenticated }).unwrap())
        })
        .method("prepare_debit", |ledger, params| async move {
            let params: PrepareParams = parse(params)?;
            let result = match ledger
                .prepare_debit(params.txid, &params.username, params.amount)
                .await
            {
                Ok(()) => PrepareResult::Prepared,
                Err(e) => PrepareResult::Rejected(e),
            };
            Ok(serde_json::to_value(result).unwrap())
        })
        .method("prepare_credit", |ledger, params| async move {
            let params: PrepareParams = parse(params)?;
            let result = match ledger
                .prepare_credit(params.txid, &params.username, params.amount)
                .await
            {
                Ok(()) => PrepareResult::Prepared,
                Err(e) => PrepareResult::Rejected(e),
            };
            Ok(serde_json::to_value(result).unwrap())
        })
        .method("commit_debit", |ledger, params| async move {
            let params: CommitParams = parse(params)?;
            ledger
                .commit_debit(
                    params.txid,
                    &params.username,
                    &params.counterparty.bank,
                    &params.counterparty.username,
                )
                .await?;
            Ok(serde_json::to_value(OkResult { ok: true }).unwrap())
        })
        .method("commit_credit", |ledger, params| async move {
            let params: CommitParams = parse(params)?;
            ledger
                .commit_credit(
                    params.txid,
                    &params.username,
                    &params.counterparty.bank,
                    &params.counterparty.username,
                )
                .await?;
            Ok(serde_json::to_value(OkResult { ok: true }).unwrap())
        })
        .method("abort_debit", |ledger, params| async move {
            let params: AbortParams = parse(params)?;
            ledger.abort_debit(params.txid, &params.username).await;
            Ok(serde_json::to_value(OkResult { ok: true }).unwrap())
        })
        .method("abort_credit", |ledger, params| async move {
            let params: AbortParams = parse(params)?;
            ledger.abort_credit(params.txid, &params.username).await;
            Ok(serde_json::to_value(OkResult { ok: true }).unwrap())
        })
        .method("balance", |ledger, params| async move {
            let params: BalanceParams = parse(params)?;
            let balance = ledger.balance(&params.username).await?;
            Ok(serde_json::to_value(BalanceResult { balance }).unwrap())
        })
        .method("history", |ledger, params| async move {
            let params: HistoryParams = parse(params)?;
            let records = ledger.history(&params.username).await?;
            Ok(serde_json::to_value(HistoryResult { records }).unwrap())
        })
}
