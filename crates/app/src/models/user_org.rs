//! The organization a user belongs to.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use serde_json::Value;

use kiroku_orm::{
    act_base, model_field_set, FieldDef, FieldSet, LogicalType, Model, ModelCore, ModelType,
    OrmResult, Registry, StorageType, PKEY,
};

#[derive(Debug, Clone)]
pub struct UserOrg {
    inner: Rc<RefCell<UserOrgData>>,
}

#[derive(Debug)]
struct UserOrgData {
    core: ModelCore,
    name: Option<String>,
    email: Option<String>,
    address: Option<String>,
}

static FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    model_field_set(vec![
        FieldDef::new(
            UserOrg::NAME,
            "name",
            "組織名",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(1, 20),
        FieldDef::new(
            UserOrg::EMAIL,
            "email",
            "メールアドレス",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(6, 50),
        FieldDef::new(
            UserOrg::ADDRESS,
            "address",
            "住所",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(10, 200),
    ])
});

impl UserOrg {
    pub const NAME: &'static str = "name";
    pub const EMAIL: &'static str = "email";
    pub const ADDRESS: &'static str = "address";

    fn act(&self, is_setter: bool) -> &Self {
        act_base(self, is_setter);
        self
    }

    pub fn name(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().name.clone()
    }

    pub fn set_name(&self, value: impl Into<String>) -> &Self {
        self.act(true);
        self.inner.borrow_mut().name = Some(value.into());
        self
    }

    pub fn email(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().email.clone()
    }

    pub fn set_email(&self, value: impl Into<String>) -> &Self {
        self.act(true);
        self.inner.borrow_mut().email = Some(value.into());
        self
    }

    pub fn address(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().address.clone()
    }

    pub fn set_address(&self, value: impl Into<String>) -> &Self {
        self.act(true);
        self.inner.borrow_mut().address = Some(value.into());
        self
    }
}

impl Model for UserOrg {
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
            Self::EMAIL => data.email.clone().map(Value::from).unwrap_or(Value::Null),
            Self::ADDRESS => data.address.clone().map(Value::from).unwrap_or(Value::Null),
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
            Self::EMAIL => data.email = value.as_str().map(str::to_string),
            Self::ADDRESS => data.address = value.as_str().map(str::to_string),
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

impl ModelType for UserOrg {
    const MODEL_NAME: &'static str = "UserOrg";
    const TABLE: &'static str = "t_user_org";

    fn field_set() -> &'static FieldSet {
        &FIELDS
    }

    fn construct(pkey: i64, registry: Weak<Registry>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(UserOrgData {
                core: ModelCore::new(pkey, registry),
                name: None,
                email: None,
                address: None,
            })),
        }
    }
}

impl UserOrg {
    /// Whether two handles alias the same entity.
    pub fn same_entity(&self, other: &UserOrg) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
