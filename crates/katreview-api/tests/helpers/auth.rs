use axum_test::TestServer;
use serde_json::json;

/// An account registered through the API
pub struct TestUser {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Register an account and return its token
pub async fn register_test_user(client: &TestServer, username: Option<&str>) -> TestUser {
    let username = username.unwrap_or("bientap").to_string();
    let password = "mat-khau-123".to_string();

    let response = client
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@katreview.vn", username),
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "register failed: {}", response.text());

    let body: serde_json::Value = response.json();
    let token = body["data"]["token"]
        .as_str()
        .expect("token in register response")
        .to_string();

    TestUser {
        username,
        password,
        token,
    }
}
