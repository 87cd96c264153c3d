//! sqlite-adapter — SQLite implementation of the pet and owner repository ports.
//!
//! Purpose
//! - Provide a lightweight, file-based store to run the clinic locally.
//! - `SqliteRepo` owns the connection; `pets()` and `owners()` hand out
//!   repository handles implementing `PetRepository` and `OwnerRepository`
//!   from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Pet ids are SQLite rowids rendered as strings.
//! - Creating a pet checks the per-owner name rule inside the same
//!   transaction as the insert.

use std::path::Path;
use std::sync::{Arc, Mutex};

use domain::{CoreError, Owner, OwnerId, OwnerRepository, Pet, PetId, PetRepository, PetType};
use rusqlite::{params, Connection, OptionalExtension};

type SharedConn = Arc<Mutex<Connection>>;

/// SQLite-backed store for local development.
#[derive(Clone)]
pub struct SqliteRepo {
    conn: SharedConn,
}

/// Pet repository handle over a shared SQLite connection.
#[derive(Clone)]
pub struct SqlitePetRepo {
    conn: SharedConn,
}

/// Owner repository handle over a shared SQLite connection.
#[derive(Clone)]
pub struct SqliteOwnerRepo {
    conn: SharedConn,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open the database at `path`, creating its parent directory if needed.
    pub fn open_creating_dirs<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CoreError::Repository(format!("create db dir: {e}")))?;
        }
        Self::new(path)
    }

    pub fn pets(&self) -> SqlitePetRepo {
        SqlitePetRepo {
            conn: self.conn.clone(),
        }
    }

    pub fn owners(&self) -> SqliteOwnerRepo {
        SqliteOwnerRepo {
            conn: self.conn.clone(),
        }
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS owners (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            city TEXT NOT NULL DEFAULT '',
            telephone TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE IF NOT EXISTS pets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT,
            owner_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pets_owner_id ON pets(owner_id);
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn lock(conn: &SharedConn) -> Result<std::sync::MutexGuard<'_, Connection>, CoreError> {
    conn.lock()
        .map_err(|_| CoreError::Repository("mutex poisoned".into()))
}

fn row_to_pet(row: &rusqlite::Row) -> Result<Pet, CoreError> {
    let id: i64 = row.get(0).map_err(map_sqerr)?;
    let name: String = row.get(1).map_err(map_sqerr)?;
    let pet_type: Option<String> = row.get(2).map_err(map_sqerr)?;
    let owner_id: String = row.get(3).map_err(map_sqerr)?;

    let pet_type = match pet_type {
        Some(t) => Some(
            PetType::parse(&t)
                .ok_or_else(|| CoreError::Repository(format!("bad pet type in db: {t}")))?,
        ),
        None => None,
    };
    Ok(Pet {
        id: Some(PetId::new(id.to_string())?),
        name,
        pet_type,
        owner_id: OwnerId::new(owner_id)
            .map_err(|e| CoreError::Repository(format!("bad owner id in db: {e}")))?,
    })
}

fn row_to_owner(row: &rusqlite::Row) -> Result<Owner, CoreError> {
    let id: String = row.get(0).map_err(map_sqerr)?;
    Ok(Owner {
        id: OwnerId::new(id)
            .map_err(|e| CoreError::Repository(format!("bad owner id in db: {e}")))?,
        first_name: row.get(1).map_err(map_sqerr)?,
        last_name: row.get(2).map_err(map_sqerr)?,
        address: row.get(3).map_err(map_sqerr)?,
        city: row.get(4).map_err(map_sqerr)?,
        telephone: row.get(5).map_err(map_sqerr)?,
    })
}

fn parse_pet_rowid(id: &PetId) -> Option<i64> {
    id.as_str().parse::<i64>().ok()
}

impl PetRepository for SqlitePetRepo {
    fn find_by_id(&self, id: &PetId) -> Result<Option<Pet>, CoreError> {
        // Ids not produced by this store cannot exist in it
        let Some(rowid) = parse_pet_rowid(id) else {
            return Ok(None);
        };
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare("SELECT id, name, type, owner_id FROM pets WHERE id = ?1")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query(params![rowid]).map_err(map_sqerr)?;
        if let Some(row) = rows.next().map_err(map_sqerr)? {
            Ok(Some(row_to_pet(row)?))
        } else {
            Ok(None)
        }
    }

    fn find_by_owner_id(&self, owner_id: &OwnerId) -> Result<Vec<Pet>, CoreError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare("SELECT id, name, type, owner_id FROM pets WHERE owner_id = ?1 ORDER BY LOWER(name), id")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query(params![owner_id.as_str()]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row_to_pet(row)?);
        }
        Ok(out)
    }

    fn save(&self, mut pet: Pet) -> Result<Pet, CoreError> {
        let conn = lock(&self.conn)?;
        let pet_type = pet.pet_type.map(|t| t.as_str());
        match pet.id.clone() {
            Some(id) => {
                let rowid = parse_pet_rowid(&id).ok_or_else(|| CoreError::pet_not_found(&id))?;
                let changed = conn
                    .execute(
                        "UPDATE pets SET name = ?1, type = ?2, owner_id = ?3 WHERE id = ?4",
                        params![pet.name, pet_type, pet.owner_id.as_str(), rowid],
                    )
                    .map_err(map_sqerr)?;
                if changed == 0 {
                    return Err(CoreError::pet_not_found(&id));
                }
            }
            None => {
                let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
                let taken = {
                    let mut stmt = tx
                        .prepare("SELECT name FROM pets WHERE owner_id = ?1")
                        .map_err(map_sqerr)?;
                    let names = stmt
                        .query_map(params![pet.owner_id.as_str()], |row| row.get::<_, String>(0))
                        .map_err(map_sqerr)?;
                    let mut taken = false;
                    for name in names {
                        if pet.has_name(&name.map_err(map_sqerr)?) {
                            taken = true;
                            break;
                        }
                    }
                    taken
                };
                if taken {
                    return Err(CoreError::AlreadyExists);
                }
                tx.execute(
                    "INSERT INTO pets(name, type, owner_id) VALUES (?1, ?2, ?3)",
                    params![pet.name, pet_type, pet.owner_id.as_str()],
                )
                .map_err(map_sqerr)?;
                let rowid = tx.last_insert_rowid();
                tx.commit().map_err(map_sqerr)?;
                pet.id = Some(PetId::new(rowid.to_string())?);
            }
        }
        Ok(pet)
    }
}

impl OwnerRepository for SqliteOwnerRepo {
    fn find_by_id(&self, id: &OwnerId) -> Result<Option<Owner>, CoreError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn
            .prepare("SELECT id, first_name, last_name, address, city, telephone FROM owners WHERE id = ?1")
            .map_err(map_sqerr)?;
        let row = stmt
            .query_row(params![id.as_str()], |row| Ok(row_to_owner(row)))
            .optional()
            .map_err(map_sqerr)?;
        row.transpose()
    }

    fn save(&self, owner: Owner) -> Result<Owner, CoreError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO owners(id, first_name, last_name, address, city, telephone) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET first_name = excluded.first_name, last_name = excluded.last_name,
             address = excluded.address, city = excluded.city, telephone = excluded.telephone",
            params![
                owner.id.as_str(),
                owner.first_name,
                owner.last_name,
                owner.address,
                owner.city,
                owner.telephone,
            ],
        )
        .map_err(map_sqerr)?;
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_db() -> (SqliteRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let repo = SqliteRepo::new(path).unwrap();
        (repo, dir)
    }

    fn mk_pet(owner: &str, name: &str, t: PetType) -> Pet {
        let mut pet = Pet::new(OwnerId::new(owner).unwrap());
        pet.name = name.into();
        pet.pet_type = Some(t);
        pet
    }

    #[test]
    fn insert_then_find_roundtrip() {
        let (repo, _dir) = tmp_db();
        let pets = repo.pets();
        let saved = pets.save(mk_pet("1", "Leo", PetType::Cat)).unwrap();
        let id = saved.id.clone().expect("rowid assigned");
        let got = pets.find_by_id(&id).unwrap().unwrap();
        assert_eq!(got, saved);
        assert_eq!(got.pet_type, Some(PetType::Cat));
    }

    #[test]
    fn insert_duplicate_name_conflict() {
        let (repo, _dir) = tmp_db();
        let pets = repo.pets();
        pets.save(mk_pet("1", "Rex", PetType::Dog)).unwrap();
        let err = pets.save(mk_pet("1", "REX", PetType::Dog)).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
        assert!(pets.save(mk_pet("2", "Rex", PetType::Dog)).is_ok());
    }

    #[test]
    fn update_changes_fields_in_place() {
        let (repo, _dir) = tmp_db();
        let pets = repo.pets();
        let mut rex = pets.save(mk_pet("1", "Rex", PetType::Dog)).unwrap();
        rex.pet_type = Some(PetType::Snake);
        pets.save(rex.clone()).unwrap();

        let all = pets.find_by_owner_id(&OwnerId::new("1").unwrap()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].pet_type, Some(PetType::Snake));
    }

    #[test]
    fn update_unknown_or_foreign_id_is_not_found() {
        let (repo, _dir) = tmp_db();
        let pets = repo.pets();
        let mut pet = mk_pet("1", "Ghost", PetType::Cat);
        pet.id = Some(PetId::new("12345").unwrap());
        assert!(matches!(pets.save(pet.clone()), Err(CoreError::NotFound { .. })));
        pet.id = Some(PetId::new("not-a-rowid").unwrap());
        assert!(matches!(pets.save(pet), Err(CoreError::NotFound { .. })));
        assert!(pets
            .find_by_id(&PetId::new("not-a-rowid").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn find_by_owner_orders_by_name() {
        let (repo, _dir) = tmp_db();
        let pets = repo.pets();
        pets.save(mk_pet("1", "max", PetType::Dog)).unwrap();
        pets.save(mk_pet("1", "Basil", PetType::Hamster)).unwrap();
        pets.save(mk_pet("2", "Iggy", PetType::Lizard)).unwrap();
        let names: Vec<_> = pets
            .find_by_owner_id(&OwnerId::new("1").unwrap())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Basil", "max"]);
    }

    #[test]
    fn owner_upsert_and_find() {
        let (repo, _dir) = tmp_db();
        let owners = repo.owners();
        let id = OwnerId::new("1").unwrap();
        let mut owner = Owner::new(id.clone(), "George", "Franklin");
        owners.save(owner.clone()).unwrap();
        owner.city = "Madison".into();
        owners.save(owner.clone()).unwrap();

        let got = owners.find_by_id(&id).unwrap().unwrap();
        assert_eq!(got, owner);
        assert!(owners
            .find_by_id(&OwnerId::new("nobody").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clinic.db");
        let id = {
            let repo = SqliteRepo::open_creating_dirs(&path).unwrap();
            repo.pets()
                .save(mk_pet("1", "Polly", PetType::Bird))
                .unwrap()
                .id
                .unwrap()
        };
        let repo = SqliteRepo::new(&path).unwrap();
        let got = repo.pets().find_by_id(&id).unwrap().unwrap();
        assert_eq!(got.name, "Polly");
    }
}
