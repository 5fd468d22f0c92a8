//! Subcommands shared by one-shot invocations and the shell.

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use mesadb::{
    Client, Credentials, Response,
    core::{
        db::{query::FilterExt, record::Record},
        value::Value,
    },
};
use serde::Serialize;

///
/// Command
///

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List rows of a table.
    Select {
        table: String,

        /// `*` or a comma-separated column list.
        #[arg(long, default_value = "*")]
        columns: String,

        /// Equality filter, repeatable: `--eq status=pronto`.
        #[arg(long = "eq", value_name = "COL=VALUE", value_parser = parse_eq)]
        eq: Vec<(String, Value)>,

        #[arg(long, value_name = "COL")]
        order: Option<String>,

        #[arg(long, requires = "order")]
        desc: bool,

        #[arg(long)]
        limit: Option<usize>,

        /// Inclusive row window, `FROM..TO`; overrides `--limit`.
        #[arg(long, value_name = "FROM..TO", value_parser = parse_range)]
        range: Option<(usize, usize)>,

        /// Print only the first row.
        #[arg(long, conflicts_with = "count")]
        single: bool,

        /// Print the number of matching rows.
        #[arg(long)]
        count: bool,
    },

    /// Insert one JSON object or an array of them.
    Insert { table: String, json: String },

    /// Merge a JSON object into every matching row.
    Update {
        table: String,
        json: String,

        #[arg(long = "eq", value_name = "COL=VALUE", value_parser = parse_eq, required = true)]
        eq: Vec<(String, Value)>,
    },

    /// Delete matching rows.
    Delete {
        table: String,

        #[arg(long = "eq", value_name = "COL=VALUE", value_parser = parse_eq, required = true)]
        eq: Vec<(String, Value)>,
    },

    /// Call a stored procedure; params are a JSON object.
    Rpc { name: String, params: Option<String> },

    /// Sign in and persist the session in the data directory.
    SignIn { email: String, password: String },

    SignOut,

    /// Print the current session, if any.
    Session,

    /// List tables with a persisted collection.
    Tables,

    /// Interactive prompt over the same commands.
    Shell,
}

///
/// Output
///

pub struct Output {
    pub text: String,
    pub ok: bool,
}

impl Output {
    fn render<T: Serialize>(response: &Response<T>) -> Result<Self> {
        Ok(Self {
            text: serde_json::to_string_pretty(response).context("rendering response")?,
            ok: response.is_ok(),
        })
    }
}

pub async fn run(client: &Client, command: Command) -> Result<Output> {
    match command {
        Command::Select {
            table,
            columns,
            eq,
            order,
            desc,
            limit,
            range,
            single,
            count,
        } => {
            let mut query = with_eq(client.from(table).select(&columns), eq);
            if let Some(column) = order {
                query = query.order(column, !desc);
            }
            if let Some(n) = limit {
                query = query.limit(n);
            }
            if let Some((from, to)) = range {
                query = query.range(from, to);
            }

            if single {
                Output::render(&query.single().await)
            } else if count {
                Output::render(&query.count().await)
            } else {
                Output::render(&query.await)
            }
        }

        Command::Insert { table, json } => {
            let rows = parse_rows(&json)?;
            Output::render(&client.from(table).insert(rows).await)
        }

        Command::Update { table, json, eq } => {
            let patch: Record = serde_json::from_str(&json).context("patch must be a JSON object")?;
            Output::render(&with_eq(client.from(table).update(patch), eq).await)
        }

        Command::Delete { table, eq } => {
            Output::render(&with_eq(client.from(table).delete(), eq).await)
        }

        Command::Rpc { name, params } => {
            let params = match params {
                Some(raw) => serde_json::from_str(&raw).context("params must be JSON")?,
                None => Value::Null,
            };
            Output::render(&client.rpc(name, params).await)
        }

        Command::SignIn { email, password } => {
            let credentials = Credentials::new(email, password);
            Output::render(&client.auth().sign_in_with_password(&credentials).await)
        }

        Command::SignOut => Output::render(&client.auth().sign_out().await),

        Command::Session => Output::render(&client.auth().get_session().await),

        Command::Tables => Output::render(&Response::from(client.store().tables())),

        Command::Shell => Err(anyhow!("already in a shell")),
    }
}

fn with_eq<Q: FilterExt>(query: Q, eq: Vec<(String, Value)>) -> Q {
    eq.into_iter()
        .fold(query, |query, (column, value)| query.eq(column, value))
}

fn parse_rows(json: &str) -> Result<Vec<Record>> {
    let value: serde_json::Value = serde_json::from_str(json).context("rows must be JSON")?;
    let rows = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value(other).map(|row| vec![row]),
    }
    .context("rows must be JSON objects")?;

    Ok(rows)
}

fn parse_eq(raw: &str) -> Result<(String, Value), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COL=VALUE, got `{raw}`"))?;
    if column.is_empty() {
        return Err("column name is empty".to_string());
    }

    Ok((column.to_string(), Value::parse_literal(value)))
}

fn parse_range(raw: &str) -> Result<(usize, usize), String> {
    let (from, to) = raw
        .split_once("..")
        .ok_or_else(|| format!("expected FROM..TO, got `{raw}`"))?;
    let from = from.parse().map_err(|err| format!("range start: {err}"))?;
    let to = to.parse().map_err(|err| format!("range end: {err}"))?;

    Ok((from, to))
}
