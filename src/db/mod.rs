mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::*;
use crate::store::NodeStore;

const NODE_COLUMNS: &str = "id, workspace_id, parent_id, type, name, description, path, depth,
     status, auto_status, is_critical, importance, ai_suggested, ai_confidence, confirmed,
     created_at, updated_at";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Workspace operations
    // ============================================================

    pub fn get_all_workspaces(&self) -> Result<Vec<Workspace>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM workspaces ORDER BY name",
        )?;

        let workspaces = stmt
            .query_map([], row_to_workspace)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(workspaces)
    }

    pub fn get_workspace(&self, id: Uuid) -> Result<Option<Workspace>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM workspaces WHERE id = ?",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_workspace(row)?)),
            None => Ok(None),
        }
    }

    pub fn create_workspace(&self, input: CreateWorkspaceInput) -> Result<Workspace> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO workspaces (id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Workspace {
            id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_workspace(
        &self,
        id: Uuid,
        input: UpdateWorkspaceInput,
    ) -> Result<Option<Workspace>> {
        let Some(existing) = self.get_workspace(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        conn.execute(
            "UPDATE workspaces SET name = ?, description = ?, updated_at = ? WHERE id = ?",
            (&name, &description, now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(Workspace {
            id,
            name,
            description,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    /// Delete a workspace together with all of its nodes.
    pub fn delete_workspace(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM workspaces WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Node operations
    // ============================================================

    pub fn get_nodes_by_workspace(&self, workspace_id: Uuid) -> Result<Vec<Node>> {
        self.query_nodes(
            "WHERE workspace_id = ? ORDER BY depth, name",
            workspace_id,
        )
    }

    pub fn get_root_nodes(&self, workspace_id: Uuid) -> Result<Vec<Node>> {
        self.query_nodes(
            "WHERE workspace_id = ? AND parent_id IS NULL ORDER BY name",
            workspace_id,
        )
    }

    pub fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_node(row)?)),
            None => Ok(None),
        }
    }

    /// Immediate children of a node, ordered by name.
    pub fn get_children(&self, parent_id: Uuid) -> Result<Vec<Node>> {
        self.query_nodes("WHERE parent_id = ? ORDER BY name", parent_id)
    }

    /// Create a node. The workspace must exist, and the parent (if any) must
    /// exist in the same workspace. `path` and `depth` come from the parent.
    pub fn create_node(&self, workspace_id: Uuid, input: CreateNodeInput) -> Result<Node> {
        self.get_workspace(workspace_id)?
            .ok_or_else(|| anyhow::anyhow!("Workspace not found"))?;

        let parent = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .get_node(parent_id)?
                    .ok_or_else(|| anyhow::anyhow!("Parent node not found"))?;
                if parent.workspace_id != workspace_id {
                    anyhow::bail!("Parent node belongs to a different workspace");
                }
                Some(parent)
            }
            None => None,
        };

        let node = Node::new(workspace_id, parent.as_ref(), input);
        self.insert_node(&node)?;
        Ok(node)
    }

    fn insert_node(&self, node: &Node) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            &format!(
                "INSERT INTO nodes ({NODE_COLUMNS})
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            rusqlite::params![
                node.id.to_string(),
                node.workspace_id.to_string(),
                node.parent_id.map(|u| u.to_string()),
                node.node_type.as_str(),
                &node.name,
                &node.description,
                serde_json::to_string(&node.path)?,
                node.depth,
                node.status().as_str(),
                node.is_auto(),
                node.is_critical,
                node.importance.map(|i| i.as_str()),
                node.ai_suggested,
                node.ai_confidence,
                node.confirmed,
                node.created_at.to_rfc3339(),
                node.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Edit a node's descriptive fields.
    pub fn update_node_details(&self, id: Uuid, input: UpdateNodeInput) -> Result<Option<Node>> {
        let Some(existing) = self.get_node(id)? else {
            return Ok(None);
        };

        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let node_type = input.node_type.unwrap_or(existing.node_type);
        let importance = input.importance.or(existing.importance);

        conn.execute(
            "UPDATE nodes SET name = ?, description = ?, type = ?, importance = ?, updated_at = ?
             WHERE id = ?",
            (
                &name,
                &description,
                node_type.as_str(),
                importance.map(|i| i.as_str()),
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(Node {
            name,
            description,
            node_type,
            importance,
            updated_at: now,
            ..existing
        }))
    }

    /// Write the `Some` fields of `update` to a node.
    pub fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut updates = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = update.status {
            updates.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(auto_status) = update.auto_status {
            updates.push("auto_status = ?");
            params.push(Box::new(auto_status));
        }
        if let Some(is_critical) = update.is_critical {
            updates.push("is_critical = ?");
            params.push(Box::new(is_critical));
        }
        if let Some(confirmed) = update.confirmed {
            updates.push("confirmed = ?");
            params.push(Box::new(confirmed));
        }

        updates.push("updated_at = ?");
        params.push(Box::new(Utc::now().to_rfc3339()));
        params.push(Box::new(id.to_string()));

        let sql = format!("UPDATE nodes SET {} WHERE id = ?", updates.join(", "));
        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = conn.execute(&sql, params_ref.as_slice())?;

        Ok(rows > 0)
    }

    /// Delete a node and its whole subtree. Ancestors are not re-derived here.
    pub fn delete_node(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM nodes WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn get_node_tree(&self, workspace_id: Uuid) -> Result<Vec<NodeTreeNode>> {
        let nodes = self.get_nodes_by_workspace(workspace_id)?;

        // Group nodes by parent_id
        let mut children_map: std::collections::HashMap<Option<Uuid>, Vec<Node>> =
            std::collections::HashMap::new();
        for node in nodes {
            children_map.entry(node.parent_id).or_default().push(node);
        }
        for siblings in children_map.values_mut() {
            siblings.sort_by(|a, b| a.name.cmp(&b.name));
        }

        fn build_subtree(
            parent_id: Option<Uuid>,
            children_map: &std::collections::HashMap<Option<Uuid>, Vec<Node>>,
        ) -> Vec<NodeTreeNode> {
            children_map
                .get(&parent_id)
                .map(|nodes| {
                    nodes
                        .iter()
                        .map(|n| NodeTreeNode {
                            node: n.clone(),
                            children: build_subtree(Some(n.id), children_map),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        Ok(build_subtree(None, &children_map))
    }

    fn query_nodes(&self, clause: &str, key: Uuid) -> Result<Vec<Node>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!("SELECT {NODE_COLUMNS} FROM nodes {clause}"))?;

        let nodes = stmt
            .query_map([key.to_string()], row_to_node)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(nodes)
    }
}

impl NodeStore for Database {
    fn get_node(&self, id: Uuid) -> Result<Option<Node>> {
        Database::get_node(self, id)
    }

    fn get_children(&self, parent_id: Uuid) -> Result<Vec<Node>> {
        Database::get_children(self, parent_id)
    }

    fn update_node(&self, id: Uuid, update: NodeUpdate) -> Result<bool> {
        Database::update_node(self, id, update)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// `<data dir>/plantree/plantree.db` for the current platform.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "plantree")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("plantree.db"))
}

fn row_to_workspace(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
        updated_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<Node> {
    let status =
        NodeStatus::from_str(&row.get::<_, String>(8)?).unwrap_or(NodeStatus::Idea);
    let path: Vec<Uuid> = serde_json::from_str(&row.get::<_, String>(6)?).unwrap_or_default();

    Ok(Node {
        id: parse_uuid(row.get::<_, String>(0)?),
        workspace_id: parse_uuid(row.get::<_, String>(1)?),
        parent_id: row.get::<_, Option<String>>(2)?.map(parse_uuid),
        node_type: NodeType::from_str(&row.get::<_, String>(3)?).unwrap_or(NodeType::Component),
        name: row.get(4)?,
        description: row.get(5)?,
        path,
        depth: row.get(7)?,
        status_source: StatusSource::from_parts(status, row.get(9)?),
        is_critical: row.get(10)?,
        importance: row
            .get::<_, Option<String>>(11)?
            .and_then(|s| Importance::from_str(&s)),
        ai_suggested: row.get(12)?,
        ai_confidence: row.get(13)?,
        confirmed: row.get(14)?,
        created_at: parse_datetime(row.get::<_, String>(15)?),
        updated_at: parse_datetime(row.get::<_, String>(16)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
