use anyhow::{Context, Result};
use std::io::Write;

use super::print_json;
use crate::client::SensiboApi;

#[tracing::instrument(skip(api, out))]
pub async fn timer<A: SensiboApi>(api: &A, uid: &str, out: &mut impl Write) -> Result<()> {
    let result = api
        .get_timer(uid)
        .await
        .with_context(|| format!("Failed to fetch timer of {}", uid))?;
    print_json(out, &result)
}

#[tracing::instrument(skip(api, out))]
pub async fn schedules<A: SensiboApi>(api: &A, uid: &str, out: &mut impl Write) -> Result<()> {
    let result = api
        .get_schedules(uid)
        .await
        .with_context(|| format!("Failed to fetch schedules of {}", uid))?;
    print_json(out, &result)
}
