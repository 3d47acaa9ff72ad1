//! A user account, owned by an organization.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use serde_json::Value;

use kiroku_orm::{
    act_base, model_field_set, FieldDef, FieldSet, LogicalType, Model, ModelCore, ModelType,
    OrmError, OrmResult, Registry, StorageType, PKEY,
};

use super::user_org::UserOrg;

#[derive(Debug, Clone)]
pub struct User {
    inner: Rc<RefCell<UserData>>,
}

#[derive(Debug)]
struct UserData {
    core: ModelCore,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    belong_id: Option<i64>,
    belong: Option<UserOrg>,
}

static FIELDS: Lazy<FieldSet> = Lazy::new(|| {
    model_field_set(vec![
        FieldDef::new(
            User::NAME,
            "name",
            "ユーザ名",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(4, 20),
        FieldDef::new(
            User::EMAIL,
            "email",
            "メールアドレス",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(4, 50),
        FieldDef::new(
            User::PASSWORD,
            "password",
            "パスワード",
            LogicalType::String,
            StorageType::VarChar,
        )
        .bounds(4, 72),
        FieldDef::new(
            User::BELONG_ID,
            "belong_id",
            "所属ID",
            LogicalType::Int,
            StorageType::BigInt,
        )
        .bounds(1, None),
        FieldDef::reference(User::BELONG, "所属", "UserOrg", User::BELONG_ID),
    ])
});

impl User {
    pub const NAME: &'static str = "name";
    pub const EMAIL: &'static str = "email";
    pub const PASSWORD: &'static str = "password";
    pub const BELONG_ID: &'static str = "belongId";
    pub const BELONG: &'static str = "belong";

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

    pub fn password(&self) -> Option<String> {
        self.act(false);
        self.inner.borrow().password.clone()
    }

    pub fn set_password(&self, value: impl Into<String>) -> &Self {
        self.act(true);
        self.inner.borrow_mut().password = Some(value.into());
        self
    }

    pub fn belong_id(&self) -> Option<i64> {
        self.act(false);
        self.inner.borrow().belong_id
    }

    pub fn set_belong_id(&self, value: i64) -> &Self {
        self.act(true);
        self.inner.borrow_mut().belong_id = Some(value);
        self
    }

    pub fn belong(&self) -> Option<UserOrg> {
        self.act(false);
        self.inner.borrow().belong.clone()
    }

    /// Attach the organization; the foreign key follows the reference.
    pub fn set_belong(&self, org: &UserOrg) -> &Self {
        self.act(true);
        let mut data = self.inner.borrow_mut();
        data.belong_id = Some(org.pkey());
        data.belong = Some(org.clone());
        self
    }

    /// Whether two handles alias the same entity.
    pub fn same_entity(&self, other: &User) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Model for User {
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
            Self::PASSWORD => data.password.clone().map(Value::from).unwrap_or(Value::Null),
            Self::BELONG_ID => data.belong_id.map(Value::from).unwrap_or(Value::Null),
            Self::BELONG => Value::Null,
            common => data.core.value(common),
        })
    }

    fn set_value(&self, field: &str, value: &Value, dirty: bool) -> OrmResult<()> {
        if self.fields().get(field).is_none() {
            return Err(self.field_not_found(field));
        }
        if field == Self::BELONG {
            return Err(OrmError::InvalidValue {
                field: field.to_string(),
                reason: "model references are assigned via set_ref".to_string(),
            });
        }
        if dirty {
            self.act(true);
        }
        let mut data = self.inner.borrow_mut();
        match field {
            Self::NAME => data.name = value.as_str().map(str::to_string),
            Self::EMAIL => data.email = value.as_str().map(str::to_string),
            Self::PASSWORD => data.password = value.as_str().map(str::to_string),
            Self::BELONG_ID => data.belong_id = value.as_i64(),
            common => {
                data.core.set_value(common, value);
            }
        }
        Ok(())
    }

    fn get_ref(&self, field: &str) -> Option<Box<dyn Model>> {
        if field == Self::BELONG {
            let org = self.inner.borrow().belong.clone()?;
            return Some(Box::new(org));
        }
        None
    }

    fn set_ref(&self, field: &str, target: &dyn Model) -> OrmResult<()> {
        if field != Self::BELONG {
            return Err(self.field_not_found(field));
        }
        let org = target
            .as_any()
            .downcast_ref::<UserOrg>()
            .cloned()
            .ok_or_else(|| {
                OrmError::Relationship(format!("expected UserOrg, got {}", target.model_name()))
            })?;
        let mut data = self.inner.borrow_mut();
        data.belong_id = Some(org.pkey());
        data.belong = Some(org);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ModelType for User {
    const MODEL_NAME: &'static str = "User";
    const TABLE: &'static str = "t_user";

    fn field_set() -> &'static FieldSet {
        &FIELDS
    }

    fn construct(pkey: i64, registry: Weak<Registry>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(UserData {
                core: ModelCore::new(pkey, registry),
                name: None,
                email: None,
                password: None,
                belong_id: None,
                belong: None,
            })),
        }
    }
}
