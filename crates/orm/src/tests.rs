//! Crate-level tests: model lifecycle, logic buffering, query
//! rendering and the save flow against the in-memory backend.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::backend::memory::MemoryBackend;
use crate::backend::{mariadb, Params, Row};
use crate::error::{DbError, OrmResult};
use crate::field::{FieldDef, FieldSet, LogicalType, StorageType};
use crate::model::{
    act_base, model_field_set, Model, ModelCore, ModelType, DELETE_FLAG, PKEY,
};
use crate::query::{Cond, Op, Query};
use crate::registry::Registry;

// ---------------------------------------------------------------- Author

#[derive(Debug, Clone)]
struct Author {
    inner: Rc<RefCell<AuthorData>>,
}

#[derive(Debug)]
struct AuthorData {
    core: ModelCore,
    name: Option<String>,
}

static AUTHOR_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    model_field_set(vec![FieldDef::new(
        Author::NAME,
        "name",
        "author name",
        LogicalType::String,
        StorageType::VarChar,
    )
    .bounds(1, 50)])
});

impl Author {
    const NAME: &'static str = "name";

    fn act(&self, is_setter: bool) -> &Self {
        act_base(self, is_setter);
        self
    }

    fn name(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().name.clone()
    }

    fn set_name(&self, value: &str) -> &Self {
        self.act(true);
        self.inner.borrow_mut().name = Some(value.to_string());
        self
    }
}

impl Model for Author {
    fn model_name(&self) -> &'static str {
        Self::MODEL_NAME
    }

    fn fields(&self) -> &'static FieldSet {
        Self::field_set()
    }

    fn pkey(&self) -> i64 {
        self.inner.borrow().core.pkey()
    }

    fn set_pkey(&self, pkey: i64) {
        self.inner.borrow_mut().core.set_pkey(pkey);
    }

    fn is_activated(&self) -> bool {
        self.inner.borrow().core.is_activated()
    }

    fn set_activated(&self, activated: bool) {
        self.inner.borrow_mut().core.set_activated(activated);
    }

    fn registry(&self) -> Option<Rc<Registry>> {
        self.inner.borrow().core.registry()
    }

    fn get_value(&self, field: &str) -> OrmResult<Value> {
        if self.fields().get(field).is_none() {
            return Err(self.field_not_found(field));
        }
        if field != PKEY {
            self.act(false);
        }
        let data = self.inner.borrow();
        Ok(match field {
            Self::NAME => data.name.clone().map(Value::from).unwrap_or(Value::Null),
            common => data.core.value(common),
        })
    }

    fn set_value(&self, field: &str, value: &Value, dirty: bool) -> OrmResult<()> {
        if self.fields().get(field).is_none() {
            return Err(self.field_not_found(field));
        }
        if dirty {
            self.act(true);
        }
        let mut data = self.inner.borrow_mut();
        match field {
            Self::NAME => data.name = value.as_str().map(str::to_string),
            common => {
                data.core.set_value(common, value);
            }
        }
        Ok(())
    }

    fn get_ref(&self, _field: &str) -> Option<Box<dyn Model>> {
        None
    }

    fn set_ref(&self, field: &str, _target: &dyn Model) -> OrmResult<()> {
        Err(self.field_not_found(field))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModelType for Author {
    const MODEL_NAME: &'static str = "Author";
    const TABLE: &'static str = "t_author";

    fn field_set() -> &'static FieldSet {
        &AUTHOR_FIELDS
    }

    fn construct(pkey: i64, registry: Weak<Registry>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AuthorData {
                core: ModelCore::new(pkey, registry),
                name: None,
            })),
        }
    }
}

// ------------------------------------------------------------------ Post

#[derive(Debug, Clone)]
struct Post {
    inner: Rc<RefCell<PostData>>,
}

#[derive(Debug)]
struct PostData {
    core: ModelCore,
    title: Option<String>,
    author_id: Option<i64>,
    author: Option<Author>,
}

static POST_FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    model_field_set(vec![
        FieldDef::new(
            Post::TITLE,
            "title",
            "title",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(1, 100),
        FieldDef::new(
            Post::AUTHOR_ID,
            "author_id",
            "author id",
            LogicalType::Int,
            StorageType::BigInt,
        )
        .bounds(1, None),
        FieldDef::reference(Post::AUTHOR, "author", "Author", Post::AUTHOR_ID),
    ])
});

impl Post {
    const TITLE: &'static str = "title";
    const AUTHOR_ID: &'static str = "authorId";
    const AUTHOR: &'static str = "author";

    fn act(&self, is_setter: bool) -> &Self {
        act_base(self, is_setter);
        self
    }

    fn title(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().title.clone()
    }

    fn set_title(&self, value: &str) -> &Self {
        self.act(true);
        self.inner.borrow_mut().title = Some(value.to_string());
        self
    }

    fn author_id(&self) -> Option<i64> {
        self.act(false);
        self.inner.borrow().author_id
    }

    fn author(&self) -> Option<Author> {
        self.act(false);
        self.inner.borrow().author.clone()
    }

    fn set_author(&self, author: &Author) -> &Self {
        self.act(true);
        let mut data = self.inner.borrow_mut();
        data.author_id = Some(author.pkey());
        data.author = Some(author.clone());
        self
    }
}

impl Model for Post {
    fn model_name(&self) -> &'static str {
        Self::MODEL_NAME
    }

    fn fields(&self) -> &'static FieldSet {
        Self::field_set()
    }

    fn pkey(&self) -> i64 {
        self.inner.borrow().core.pkey()
    }

    fn set_pkey(&self, pkey: i64) {
        self.inner.borrow_mut().core.set_pkey(pkey);
    }

    fn is_activated(&self) -> bool {
        self.inner.borrow().core.is_activated()
    }

    fn set_activated(&self, activated: bool) {
        self.inner.borrow_mut().core.set_activated(activated);
    }

    fn registry(&self) -> Option<Rc<Registry>> {
        self.inner.borrow().core.registry()
    }

    fn get_value(&self, field: &str) -> OrmResult<Value> {
        if self.fields().get(field).is_none() {
            return Err(self.field_not_found(field));
        }
        if field != PKEY {
            self.act(false);
        }
        let data = self.inner.borrow();
        Ok(match field {
            Self::TITLE => data.title.clone().map(Value::from).unwrap_or(Value::Null),
            Self::AUTHOR_ID => data.author_id.map(Value::from).unwrap_or(Value::Null),
            Self::AUTHOR => Value::Null,
            common => data.core.value(common),
        })
    }

    fn set_value(&self, field: &str, value: &Value, dirty: bool) -> OrmResult<()> {
        if self.fields().get(field).is_none() {
            return Err(self.field_not_found(field));
        }
        if field == Self::AUTHOR {
            return Err(crate::error::OrmError::InvalidValue {
                field: field.to_string(),
                reason: "model references are assigned via set_ref".to_string(),
            });
        }
        if dirty {
            self.act(true);
        }
        let mut data = self.inner.borrow_mut();
        match field {
            Self::TITLE => data.title = value.as_str().map(str::to_string),
            Self::AUTHOR_ID => data.author_id = value.as_i64(),
            common => {
                data.core.set_value(common, value);
            }
        }
        Ok(())
    }

    fn get_ref(&self, field: &str) -> Option<Box<dyn Model>> {
        if field == Self::AUTHOR {
            let author = self.inner.borrow().author.clone()?;
            return Some(Box::new(author));
        }
        None
    }

    fn set_ref(&self, field: &str, target: &dyn Model) -> OrmResult<()> {
        if field != Self::AUTHOR {
            return Err(self.field_not_found(field));
        }
        let author = target
            .as_any()
            .downcast_ref::<Author>()
            .cloned()
            .ok_or_else(|| {
                crate::error::OrmError::Relationship(format!(
                    "expected Author, got {}",
                    target.model_name()
                ))
            })?;
        let mut data = self.inner.borrow_mut();
        data.author_id = Some(author.pkey());
        data.author = Some(author);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModelType for Post {
    const MODEL_NAME: &'static str = "Post";
    const TABLE: &'static str = "t_post";

    fn field_set() -> &'static FieldSet {
        &POST_FIELDS
    }

    fn construct(pkey: i64, registry: Weak<Registry>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PostData {
                core: ModelCore::new(pkey, registry),
                title: None,
                author_id: None,
                author: None,
            })),
        }
    }
}

// ----------------------------------------------------------------- setup

fn setup() -> (Rc<Registry>, Rc<MemoryBackend>) {
    let backend = Rc::new(MemoryBackend::new());
    let registry = Registry::new(backend.clone());
    registry.register::<Author>();
    registry.register::<Post>();
    (registry, backend)
}

fn seed_author(backend: &MemoryBackend, pkey: i64, name: &str) {
    let mut row = Row::new();
    row.insert(PKEY.to_string(), json!(pkey));
    row.insert(Author::NAME.to_string(), json!(name));
    backend.insert_row(Author::TABLE, pkey, row);
}

// -------------------------------------------------------- model lifecycle

#[test]
fn new_models_mint_strictly_decreasing_pseudo_keys() {
    let mut previous = 0;
    for _ in 0..4 {
        let author = Author::construct(0, Weak::new());
        assert!(author.pkey() < 0);
        assert!(author.pkey() < previous);
        previous = author.pkey();
    }
}

#[test]
fn existing_key_stays_non_activated_until_touched() {
    let author = Author::construct(21, Weak::new());
    assert_eq!(author.pkey(), 21);
    assert!(!author.is_activated());

    author.set_name("sato");
    assert!(author.is_activated());
    assert_eq!(author.inner.borrow().name.as_deref(), Some("sato"));
}

#[test]
fn to_map_skips_references_and_pseudo_keys() {
    let post = Post::construct(0, Weak::new());
    post.set_title("draft");
    post.inner.borrow_mut().author_id = Some(3);

    let row = post.to_map(None).unwrap();
    assert!(!row.contains_key(Post::AUTHOR));
    assert!(!row.contains_key(PKEY));
    assert_eq!(row.get(Post::TITLE), Some(&json!("draft")));

    post.set_pkey(12);
    let row = post.to_map(None).unwrap();
    assert_eq!(row.get(PKEY), Some(&json!(12)));
}

#[test]
fn from_map_without_overwrite_keeps_existing_values() {
    let author = Author::construct(5, Weak::new());
    author.set_name("original");

    let mut row = Row::new();
    row.insert(Author::NAME.to_string(), json!("replacement"));
    author.from_map(&row, false, false).unwrap();
    assert_eq!(author.inner.borrow().name.as_deref(), Some("original"));

    author.from_map(&row, true, false).unwrap();
    assert_eq!(author.inner.borrow().name.as_deref(), Some("replacement"));
    assert!(author.is_activated());
}

#[test]
fn unknown_field_is_reported_not_swallowed() {
    let author = Author::construct(1, Weak::new());
    assert!(author.get_value("nope").is_err());
    assert!(author.set_value("nope", &Value::Null, false).is_err());
}

#[test]
fn types_classify_by_logical_and_storage() {
    let post = Post::construct(1, Weak::new());
    let logical = post.logical_types();
    assert_eq!(logical.get(Post::AUTHOR), Some(&LogicalType::ModelRef));
    assert_eq!(logical.get(Post::TITLE), Some(&LogicalType::String));
    let storage = post.storage_types();
    assert_eq!(storage.get(Post::AUTHOR_ID), Some(&StorageType::BigInt));
    assert_eq!(storage.get(PKEY), Some(&StorageType::Int));
}

#[test]
fn dependent_models_derive_from_reference_fields() {
    let post = Post::construct(1, Weak::new());
    let dependents = post.dependent_models();
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].field, Post::AUTHOR);
    assert_eq!(dependents[0].model_name, "Author");
    assert_eq!(dependents[0].key_field, Post::AUTHOR_ID);
}

// ------------------------------------------------------------- registration

#[test]
fn register_is_idempotent_for_new_entities() {
    let (registry, _backend) = setup();
    let logic = registry.logic::<Author>().unwrap();

    let author = logic.get_model(0);
    assert!(author.pkey() < 0);
    assert_eq!(logic.pending_creates(), 1);

    logic.register(author.clone(), false);
    logic.register(author.clone(), false);
    assert_eq!(logic.pending_creates(), 1);
}

#[test]
fn register_canonicalizes_by_primary_key() {
    let (registry, _backend) = setup();
    let logic = registry.logic::<Author>().unwrap();

    let first = logic.get_model(33);
    first.set_name("canonical");

    let duplicate = Author::construct(33, Rc::downgrade(&registry));
    let resolved = logic.register(duplicate, false);
    assert_eq!(resolved.inner.borrow().name.as_deref(), Some("canonical"));
    assert!(Rc::ptr_eq(&resolved.inner, &first.inner));
}

#[test]
fn get_model_returns_the_same_handle_per_key() {
    let (registry, _backend) = setup();
    let logic = registry.logic::<Author>().unwrap();

    let first = logic.get_model(7);
    let second = logic.get_model(7);
    assert!(Rc::ptr_eq(&first.inner, &second.inner));
}

#[test]
fn deactivate_withdraws_a_pending_update() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 4, "tanaka");

    let author = logic.get_model(4);
    author.set_name("renamed");
    assert_eq!(logic.pending_updates(), 1);

    author.deactivate();
    assert_eq!(logic.pending_updates(), 0);
    assert!(!author.is_activated());
}

// ------------------------------------------------------------- load / save

#[test]
fn load_populates_from_storage() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 9, "yamada");

    let author = logic.get_model(9);
    let loaded = logic.load(&author, false).unwrap();
    assert!(loaded);
    assert!(author.is_activated());
    assert_eq!(author.name().as_deref(), Some("yamada"));

    let missing = logic.get_model(999);
    assert!(!logic.load(&missing, false).unwrap());
    let pseudo = logic.get_model(0);
    assert!(!logic.load(&pseudo, false).unwrap());
}

#[test]
fn load_with_lock_enrolls_for_update() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 2, "suzuki");

    let author = logic.get_model(2);
    assert!(logic.load(&author, true).unwrap());
    assert_eq!(logic.pending_updates(), 1);

    logic.cancel(&author);
    assert_eq!(logic.pending_updates(), 0);
    assert!(author.is_activated());
}

#[test]
fn lazy_activation_loads_on_first_read() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 11, "kobayashi");

    let author = logic.get_model(11);
    assert!(!author.is_activated());
    assert_eq!(author.name().as_deref(), Some("kobayashi"));
    assert!(author.is_activated());
}

#[test]
fn save_assigns_sequential_keys_past_the_stored_maximum() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 5, "existing");

    let first = logic.get_model(0);
    first.set_name("first");
    let second = logic.get_model(0);
    second.set_name("second");

    logic.save().unwrap();
    assert_eq!(first.pkey(), 6);
    assert_eq!(second.pkey(), 7);
    assert_eq!(logic.pending_creates(), 0);
    assert!(logic.knows(6) && logic.knows(7));

    let row = backend.row(Author::TABLE, 6).unwrap();
    assert_eq!(row.get(Author::NAME), Some(&json!("first")));
    assert_eq!(row.get(DELETE_FLAG), Some(&json!(false)));
    assert!(row.contains_key("createDate"));
    assert!(row.contains_key("updateDate"));
}

#[test]
fn failed_create_phase_keeps_buffers_for_retry() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();

    let author = logic.get_model(0);
    author.set_name("persistent");
    assert_eq!(logic.pending_creates(), 1);

    backend.fail_next("create", DbError::Execute("disk full".to_string()));
    assert!(logic.save().is_err());
    assert_eq!(logic.pending_creates(), 1);

    logic.save().unwrap();
    assert_eq!(logic.pending_creates(), 0);
    assert_eq!(backend.row_count(Author::TABLE), 1);
    assert!(author.pkey() > 0);
}

#[test]
fn update_phase_writes_changed_models() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 3, "before");

    let author = logic.get_model(3);
    assert!(logic.load(&author, true).unwrap());
    author.set_name("after");

    logic.save().unwrap();
    assert_eq!(logic.pending_updates(), 0);
    let row = backend.row(Author::TABLE, 3).unwrap();
    assert_eq!(row.get(Author::NAME), Some(&json!("after")));
    assert!(row.contains_key("updateDate"));
}

#[test]
fn soft_delete_flags_the_row_on_next_save() {
    let (registry, backend) = setup();
    let logic = registry.logic::<Author>().unwrap();
    seed_author(&backend, 8, "retiring");

    let author = logic.get_model(8);
    assert!(logic.load(&author, false).unwrap());
    logic.delete(&author).unwrap();
    assert_eq!(logic.pending_updates(), 1);

    logic.save().unwrap();
    let row = backend.row(Author::TABLE, 8).unwrap();
    assert_eq!(row.get(DELETE_FLAG), Some(&json!(true)));
    assert_eq!(backend.row_count(Author::TABLE), 1);

    logic.delete_physical(&author).unwrap();
    assert_eq!(backend.row_count(Author::TABLE), 1);
}

#[test]
fn cascade_save_persists_dependents_first() {
    let (registry, backend) = setup();
    let authors = registry.logic::<Author>().unwrap();
    let posts = registry.logic::<Post>().unwrap();

    let author = authors.get_model(0);
    author.set_name("ueda");
    let post = posts.get_model(0);
    post.set_title("hello");
    post.set_author(&author);
    assert!(post.author_id().unwrap() < 0);

    posts.save().unwrap();
    assert!(author.pkey() > 0);
    assert_eq!(post.author_id(), Some(author.pkey()));

    let row = backend.row(Post::TABLE, post.pkey()).unwrap();
    assert_eq!(row.get(Post::AUTHOR_ID), Some(&json!(author.pkey())));
    assert_eq!(backend.row_count(Author::TABLE), 1);
}

// ------------------------------------------------------------------ select

#[test]
fn select_builds_full_models_and_attaches_placeholders() {
    let (registry, backend) = setup();
    let authors = registry.logic::<Author>().unwrap();
    let posts = registry.logic::<Post>().unwrap();
    seed_author(&backend, 1, "hoshino");
    let mut row = Row::new();
    row.insert(PKEY.to_string(), json!(10));
    row.insert(Post::TITLE.to_string(), json!("stored"));
    row.insert(Post::AUTHOR_ID.to_string(), json!(1));
    backend.insert_row(Post::TABLE, 10, row);

    let query = posts.query(vec![Cond::new(Post::TITLE, Op::Eq)]);
    let mut params = Params::new();
    params.insert(":title".to_string(), json!("stored"));
    let found = posts.select(&query, &params, false).unwrap();
    assert_eq!(found.len(), 1);

    let post = &found[0];
    assert_eq!(post.pkey(), 10);
    assert!(post.is_activated());

    // the reference came back as a lazily-loadable placeholder
    let author = post.author().unwrap();
    assert!(!author.is_activated());
    assert_eq!(author.pkey(), 1);
    assert_eq!(author.name().as_deref(), Some("hoshino"));
    assert!(authors.knows(1));
}

#[test]
fn select_with_no_match_is_empty_not_an_error() {
    let (registry, _backend) = setup();
    let posts = registry.logic::<Post>().unwrap();
    let query = posts.query(vec![Cond::with(Post::TITLE, Op::Eq, vec![json!("none")])]);
    let found = posts.select(&query, &Params::new(), false).unwrap();
    assert!(found.is_empty());
}

// --------------------------------------------------------------- rendering

#[test]
fn equality_renders_column_and_named_placeholder() {
    let query = Query::new(
        Author::TABLE,
        Author::field_set(),
        vec![Cond::new(Author::NAME, Op::Eq)],
    );
    assert_eq!(query.render(mariadb::op_template).unwrap(), "name = :name");
}

#[test]
fn default_join_is_and_with_explicit_or_override() {
    let query = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![
            Cond::new(Post::TITLE, Op::Starts),
            Cond::new(Post::AUTHOR_ID, Op::NotNull),
        ],
    );
    assert_eq!(
        query.render(mariadb::op_template).unwrap(),
        "title like ':title%' AND author_id is not null"
    );

    let query = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![
            Cond::new(Post::TITLE, Op::Eq),
            Cond::joiner(Op::Or),
            Cond::new(Post::AUTHOR_ID, Op::Null),
        ],
    );
    assert_eq!(
        query.render(mariadb::op_template).unwrap(),
        "title = :title OR author_id is null"
    );
}

#[test]
fn between_requires_exactly_two_values() {
    let one_value = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![Cond::with(Post::AUTHOR_ID, Op::Between, vec![json!(1)])],
    );
    assert!(one_value.render(mariadb::op_template).is_err());

    let two_values = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![Cond::with(
            Post::AUTHOR_ID,
            Op::Between,
            vec![json!(1), json!(9)],
        )],
    );
    assert_eq!(
        two_values.render(mariadb::op_template).unwrap(),
        "author_id between 1 and 9"
    );
}

#[test]
fn unknown_field_fails_rendering() {
    let query = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![Cond::new("missing", Op::Eq)],
    );
    assert!(query.render(mariadb::op_template).is_err());
}

#[test]
fn literals_render_inline() {
    let query = Query::new(
        Post::TABLE,
        Post::field_set(),
        vec![Cond::with(Post::TITLE, Op::Contains, vec![json!("rust")])],
    );
    assert_eq!(
        query.render(mariadb::op_template).unwrap(),
        "title like '%rust%'"
    );
}
