//! `ProjectStore` backed by Valkey through a fred client.
//!
//! Records live as JSON in one hash (`lightdeck:projects`, field = id). The
//! largest id ever issued is kept in `lightdeck:projects:seq` so deleted ids
//! are never handed out again, and `lightdeck:projects:names` maps each name
//! to the id holding it. Every write touching more than one key runs as a
//! Lua script so the three stay consistent.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use fred::prelude::*;
use lightdeck_common::{Project, ProjectDraft, ProjectPatch, keys};
use tokio::sync::OnceCell;

use crate::application::ports::{ProjectStore, StoreStatus, StoreWrite};
use crate::domain::next_project_id;

/// KEYS: projects, names, seq. ARGV: id, name, json.
/// Returns 1 stored, 0 name taken, -1 id taken.
const INSERT_SCRIPT: &str = r"
if redis.call('HEXISTS', KEYS[2], ARGV[2]) == 1 then return 0 end
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[3]) == 0 then return -1 end
redis.call('HSET', KEYS[2], ARGV[2], ARGV[1])
local cur = tonumber(redis.call('GET', KEYS[3]) or '0')
if tonumber(ARGV[1]) > cur then redis.call('SET', KEYS[3], ARGV[1]) end
return 1
";

/// KEYS: projects, names. ARGV: id, json, name.
/// Returns 1 stored, 0 id gone, -1 name held by another id.
const UPDATE_SCRIPT: &str = r"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then return 0 end
local ok, record = pcall(cjson.decode, current)
local old = ok and type(record) == 'table' and record['name'] or nil
if old ~= ARGV[3] then
  local holder = redis.call('HGET', KEYS[2], ARGV[3])
  if holder and holder ~= ARGV[1] then return -1 end
  if old and redis.call('HGET', KEYS[2], old) == ARGV[1] then
    redis.call('HDEL', KEYS[2], old)
  end
end
redis.call('HSET', KEYS[2], ARGV[3], ARGV[1])
redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
return 1
";

/// KEYS: projects, names. ARGV: id. Returns 1 removed, 0 unknown.
const DELETE_SCRIPT: &str = r"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then return 0 end
redis.call('HDEL', KEYS[1], ARGV[1])
local ok, record = pcall(cjson.decode, current)
local name = ok and type(record) == 'table' and record['name'] or nil
if name and redis.call('HGET', KEYS[2], name) == ARGV[1] then
  redis.call('HDEL', KEYS[2], name)
end
return 1
";

/// Give up on id allocation after this many lost races.
const MAX_ID_ATTEMPTS: usize = 8;

/// Next id from the hash fields present and the raw sequence value. An
/// absent sequence key counts as zero.
fn allocate_id(ids: &[String], high_water: Option<&str>) -> Result<u64> {
    let high_water = match high_water {
        None => 0,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("corrupt {} value '{raw}'", keys::PROJECT_SEQ))?,
    };
    Ok(next_project_id(ids.iter().map(String::as_str), high_water))
}

/// Reply of [`INSERT_SCRIPT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Stored,
    NameTaken,
    IdTaken,
}

impl Claim {
    fn from_reply(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Stored),
            0 => Ok(Self::NameTaken),
            -1 => Ok(Self::IdTaken),
            other => anyhow::bail!("unexpected reply {other} from insert script"),
        }
    }
}

pub struct ValkeyProjectStore {
    url: String,
    user: Option<String>,
    password: Option<String>,
    client: OnceCell<Client>,
}

impl ValkeyProjectStore {
    /// A handle that connects on first use and reuses the connection
    /// afterwards.
    #[must_use]
    pub fn new(url: impl Into<String>, user: Option<String>, password: Option<String>) -> Self {
        Self {
            url: url.into(),
            user,
            password,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let mut config = Config::from_url(&self.url)
                    .with_context(|| format!("invalid Valkey URL {}", self.url))?;
                config.username.clone_from(&self.user);
                config.password.clone_from(&self.password);

                let client = Builder::from_config(config)
                    .with_connection_config(|conn_config| {
                        conn_config.connection_timeout = Duration::from_secs(5);
                        conn_config.internal_command_timeout = Duration::from_secs(10);
                    })
                    .set_policy(ReconnectPolicy::new_exponential(0, 100, 5000, 5))
                    .build()?;
                client.init().await.context("failed to connect to Valkey")?;
                tracing::info!(url = %self.url, user = ?self.user, "Valkey connection ready");
                Ok::<_, anyhow::Error>(client)
            })
            .await
    }

    /// Close the connection if one was ever opened.
    pub async fn close(&self) {
        if let Some(client) = self.client.get() {
            if let Err(e) = client.quit().await {
                tracing::warn!(error = %e, "Valkey QUIT failed");
            }
        }
    }

    async fn ping(&self) -> Result<String> {
        self.client()
            .await?
            .ping::<String>(None)
            .await
            .context("PING failed")
    }

    fn decode(id: &str, json: &str) -> Option<Project> {
        match serde_json::from_str::<Project>(json) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::warn!(project_id = %id, error = %e, "skipping malformed project record");
                None
            }
        }
    }
}

#[async_trait]
impl ProjectStore for ValkeyProjectStore {
    async fn list(&self) -> Result<Vec<Project>> {
        let raw: HashMap<String, String> = self
            .client()
            .await?
            .hgetall(keys::PROJECTS)
            .await
            .context("failed to HGETALL projects")?;
        let mut projects: Vec<Project> = raw
            .iter()
            .filter_map(|(id, json)| Self::decode(id, json))
            .collect();
        projects.sort_by_key(|p| (p.id.parse::<u64>().unwrap_or(u64::MAX), p.id.clone()));
        Ok(projects)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        let raw: Option<String> = self
            .client()
            .await?
            .hget(keys::PROJECTS, id)
            .await
            .context("failed to HGET project")?;
        Ok(raw.and_then(|json| Self::decode(id, &json)))
    }

    async fn insert(&self, draft: ProjectDraft) -> Result<StoreWrite> {
        let client = self.client().await?;
        for _ in 0..MAX_ID_ATTEMPTS {
            let ids: Vec<String> = client
                .hkeys(keys::PROJECTS)
                .await
                .context("failed to HKEYS projects")?;
            let high_water: Option<String> = client
                .get(keys::PROJECT_SEQ)
                .await
                .context("failed to GET project sequence")?;
            let id = allocate_id(&ids, high_water.as_deref())?.to_string();

            let project = draft.clone().into_project(id.clone(), Utc::now());
            let json = serde_json::to_string(&project)?;
            let reply: i64 = client
                .eval(
                    INSERT_SCRIPT,
                    vec![keys::PROJECTS, keys::PROJECT_NAMES, keys::PROJECT_SEQ],
                    vec![id.clone(), project.name.clone(), json],
                )
                .await
                .context("failed to run insert script")?;
            match Claim::from_reply(reply)? {
                Claim::Stored => {
                    tracing::debug!(project_id = %id, name = %project.name, "stored project");
                    return Ok(StoreWrite::Stored(project));
                }
                Claim::NameTaken => return Ok(StoreWrite::NameTaken),
                Claim::IdTaken => {
                    tracing::debug!(project_id = %id, "id taken concurrently, retrying");
                }
            }
        }
        anyhow::bail!("could not allocate a project id after {MAX_ID_ATTEMPTS} attempts")
    }

    async fn update(&self, id: &str, patch: ProjectPatch) -> Result<StoreWrite> {
        let Some(mut project) = self.find_by_id(id).await? else {
            return Ok(StoreWrite::Missing);
        };
        project.apply(patch, Utc::now());
        let json = serde_json::to_string(&project)?;
        let reply: i64 = self
            .client()
            .await?
            .eval(
                UPDATE_SCRIPT,
                vec![keys::PROJECTS, keys::PROJECT_NAMES],
                vec![id.to_string(), json, project.name.clone()],
            )
            .await
            .context("failed to run update script")?;
        match reply {
            1 => Ok(StoreWrite::Stored(project)),
            0 => Ok(StoreWrite::Missing),
            -1 => Ok(StoreWrite::NameTaken),
            other => anyhow::bail!("unexpected reply {other} from update script"),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed: i64 = self
            .client()
            .await?
            .eval(
                DELETE_SCRIPT,
                vec![keys::PROJECTS, keys::PROJECT_NAMES],
                vec![id.to_string()],
            )
            .await
            .context("failed to run delete script")?;
        Ok(removed > 0)
    }

    async fn status(&self) -> StoreStatus {
        match self.ping().await {
            Ok(_) => StoreStatus {
                backend: "valkey",
                connected: true,
                message: "Valkey connection OK".into(),
            },
            Err(e) => StoreStatus {
                backend: "valkey",
                connected: false,
                message: format!("{e:#}"),
            },
        }
    }
}
