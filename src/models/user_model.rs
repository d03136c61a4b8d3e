use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::serialize_object_id;

use super::validation::{FieldError, Validate, Violations};

pub const MIN_PASSWORD_LENGTH: usize = 7;
pub const MAX_AGE: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub age: i32,
    pub role: Role,
}

/// Caller identity recovered from a verified access token.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: ObjectId,
    pub username: String,
    pub age: i32,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub password: String,
    pub age: i32,
}

fn check_credentials(violations: &mut Violations, username: &str, password: &str, age: i32) {
    violations.not_blank(username, "username");
    violations.check(
        password.chars().count() >= MIN_PASSWORD_LENGTH,
        "password",
        format!("password must be longer than or equal to {MIN_PASSWORD_LENGTH} characters"),
    );
    violations.in_range(age, 0, MAX_AGE, "age");
}

impl Validate for SignUp {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        check_credentials(&mut violations, &self.username, &self.password, self.age);
        violations.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub age: i32,
    pub role: Option<Role>,
}

impl CreateUser {
    pub fn split(self) -> (SignUp, Role) {
        let role = self.role.unwrap_or(Role::Customer);
        let credentials = SignUp {
            username: self.username,
            password: self.password,
            age: self.age,
        };
        (credentials, role)
    }
}

impl Validate for CreateUser {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        check_credentials(&mut violations, &self.username, &self.password, self.age);
        violations.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignIn {
    pub username: String,
    pub password: String,
}

impl Validate for SignIn {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.not_blank(&self.username, "username");
        violations.not_blank(&self.password, "password");
        violations.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

impl Validate for ChangePassword {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        violations.not_blank(&self.old_password, "oldPassword");
        violations.check(
            self.new_password.chars().count() >= MIN_PASSWORD_LENGTH,
            "newPassword",
            format!("newPassword must be longer than or equal to {MIN_PASSWORD_LENGTH} characters"),
        );
        violations.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub age: Option<i32>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(age) = self.age {
            user.age = age;
        }
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut violations = Violations::new();
        if let Some(username) = &self.username {
            violations.not_blank(username, "username");
        }
        if let Some(age) = self.age {
            violations.in_range(age, 0, MAX_AGE, "age");
        }
        violations.finish()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub username: String,
    pub age: i32,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            age: user.age,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

impl From<Vec<User>> for UsersResponse {
    fn from(users: Vec<User>) -> Self {
        UsersResponse {
            users: users.into_iter().map(UserResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}
