use crate::error::{Error, Result};
use crate::forms::{NewCustomer, NewMaterial};
use crate::models::{round_cents, Document};
use crate::types::{Customer, DocumentKind, Material, Party, StoredDocument, StoredItem};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        number TEXT NOT NULL,
        date TEXT NOT NULL,
        seller_name TEXT NOT NULL,
        seller_address TEXT NOT NULL,
        seller_tax_id TEXT NOT NULL,
        buyer_name TEXT NOT NULL,
        buyer_address TEXT NOT NULL,
        buyer_tax_id TEXT NOT NULL,
        total_net REAL NOT NULL,
        total_tax REAL NOT NULL,
        total_gross REAL NOT NULL,
        document_type TEXT NOT NULL CHECK (document_type IN ('invoice', 'quote'))
    );
    CREATE TABLE IF NOT EXISTS document_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL,
        description TEXT NOT NULL,
        quantity REAL NOT NULL,
        unit_price REAL NOT NULL,
        tax_rate REAL NOT NULL,
        discount REAL NOT NULL,
        net_amount REAL NOT NULL,
        tax_amount REAL NOT NULL,
        gross_amount REAL NOT NULL,
        FOREIGN KEY (document_id) REFERENCES documents(id)
    );
    CREATE TABLE IF NOT EXISTS customers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        address TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS materials (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        unit_price REAL NOT NULL,
        stock INTEGER NOT NULL
    );
";

impl ToSql for DocumentKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DocumentKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Opens (or creates) the store at `db_path` and creates missing tables.
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        debug!(path = %db_path.display(), "opened database");
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Db {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Stores a snapshot of the document: one header row plus one row per item, in item order.
    /// Amounts are rounded to cents. Returns the header id.
    pub fn save_document(&self, doc: &Document, kind: DocumentKind) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO documents (
                number, date,
                seller_name, seller_address, seller_tax_id,
                buyer_name, buyer_address, buyer_tax_id,
                total_net, total_tax, total_gross, document_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                doc.number(),
                doc.date(),
                &doc.seller().name,
                &doc.seller().address,
                doc.seller_tax_id(),
                &doc.buyer().name,
                &doc.buyer().address,
                doc.buyer_tax_id(),
                round_cents(doc.total_net()),
                round_cents(doc.total_tax()),
                round_cents(doc.total_gross()),
                kind,
            ],
        )?;
        let document_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO document_items (
                    document_id, description, quantity, unit_price, tax_rate, discount,
                    net_amount, tax_amount, gross_amount
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for item in doc.items() {
                stmt.execute(params![
                    document_id,
                    item.description(),
                    item.quantity(),
                    item.unit_price(),
                    item.tax_rate_percent(),
                    item.discount(),
                    round_cents(item.net_amount()),
                    round_cents(item.tax_amount()),
                    round_cents(item.gross_amount()),
                ])?;
            }
        }
        tx.commit()?;
        info!(
            document_id,
            number = doc.number(),
            kind = %kind,
            items = doc.items().len(),
            "saved document"
        );
        Ok(document_id)
    }

    pub fn get_document(&self, id: i64) -> Result<Option<StoredDocument>> {
        let conn = self.lock()?;
        let header = conn
            .query_row(
                "SELECT id, number, date, seller_name, seller_address, seller_tax_id,
                        buyer_name, buyer_address, buyer_tax_id,
                        total_net, total_tax, total_gross, document_type
                 FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredDocument {
                        id: row.get(0)?,
                        number: row.get(1)?,
                        date: row.get(2)?,
                        seller: Party::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
                        seller_tax_id: row.get(5)?,
                        buyer: Party::new(row.get::<_, String>(6)?, row.get::<_, String>(7)?),
                        buyer_tax_id: row.get(8)?,
                        total_net: row.get(9)?,
                        total_tax: row.get(10)?,
                        total_gross: row.get(11)?,
                        document_type: row.get(12)?,
                        items: Vec::new(),
                    })
                },
            )
            .optional()?;
        let Some(mut header) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, description, quantity, unit_price, tax_rate, discount,
                    net_amount, tax_amount, gross_amount
             FROM document_items WHERE document_id = ?1 ORDER BY id",
        )?;
        header.items = stmt
            .query_map(params![id], |row| {
                Ok(StoredItem {
                    id: row.get(0)?,
                    description: row.get(1)?,
                    quantity: row.get(2)?,
                    unit_price: row.get(3)?,
                    tax_rate: row.get(4)?,
                    discount: row.get(5)?,
                    net_amount: row.get(6)?,
                    tax_amount: row.get(7)?,
                    gross_amount: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(header))
    }

    pub fn save_customer(&self, customer: &NewCustomer) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO customers (name, address, phone, email) VALUES (?1, ?2, ?3, ?4)",
            params![customer.name, customer.address, customer.phone, customer.email],
        )?;
        let id = conn.last_insert_rowid();
        info!(customer_id = id, name = %customer.name, "saved customer");
        Ok(id)
    }

    pub fn get_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, name, address, phone, email FROM customers ORDER BY id")?;
        let rows = stmt
            .query_map([], customer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.lock()?;
        let customer = conn
            .query_row(
                "SELECT id, name, address, phone, email FROM customers WHERE id = ?1",
                params![id],
                customer_from_row,
            )
            .optional()?;
        Ok(customer)
    }

    pub fn save_material(&self, material: &NewMaterial) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO materials (name, description, unit_price, stock) VALUES (?1, ?2, ?3, ?4)",
            params![material.name, material.description, material.unit_price, material.stock],
        )?;
        let id = conn.last_insert_rowid();
        info!(material_id = id, name = %material.name, "saved material");
        Ok(id)
    }

    pub fn get_materials(&self) -> Result<Vec<Material>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, description, unit_price, stock FROM materials ORDER BY id")?;
        let rows = stmt
            .query_map([], material_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_material(&self, id: i64) -> Result<Option<Material>> {
        let conn = self.lock()?;
        let material = conn
            .query_row(
                "SELECT id, name, description, unit_price, stock FROM materials WHERE id = ?1",
                params![id],
                material_from_row,
            )
            .optional()?;
        Ok(material)
    }
}

fn customer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
    })
}

fn material_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        unit_price: row.get(3)?,
        stock: row.get(4)?,
    })
}
