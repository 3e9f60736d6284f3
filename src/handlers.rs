use crate::auth::CurrentMember;
use crate::error::LedgerError;
use crate::schemas::{ExpenseDraft, GroupNameJson, LoginForm, NewExpense, RegisterUser, UpdateUser};
use crate::service::LedgerService;
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

type Service = web::Data<Arc<LedgerService>>;
type Response = Result<HttpResponse, LedgerError>;

fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": text }))
}

#[get("/")]
async fn root() -> HttpResponse {
    message("Welcome to the SplitLedger API")
}

// Users

#[post("/users/register")]
async fn register_user(service: Service, json: web::Json<RegisterUser>) -> Response {
    let profile = service.register(json.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[post("/users/login")]
async fn login(service: Service, form: web::Form<LoginForm>) -> Response {
    let form = form.into_inner();
    let token = service.login(&form.username, &form.password).await?;
    Ok(HttpResponse::Ok().json(token))
}

#[get("/users/me")]
async fn read_me(service: Service, member: CurrentMember) -> Response {
    Ok(HttpResponse::Ok().json(service.profile(&member.0).await?))
}

#[put("/users/me")]
async fn update_me(service: Service, member: CurrentMember, json: web::Json<UpdateUser>) -> Response {
    let profile = service.update_profile(&member.0, json.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[delete("/users/me")]
async fn delete_me(service: Service, member: CurrentMember) -> Response {
    service.delete_user(&member.0).await?;
    Ok(message("User deleted successfully"))
}

// Groups

#[post("/groups")]
async fn create_group(service: Service, member: CurrentMember, json: web::Json<GroupNameJson>) -> Response {
    let group = service.create_group(&member.0, json.into_inner().name).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[get("/groups")]
async fn list_groups(service: Service, member: CurrentMember) -> Response {
    Ok(HttpResponse::Ok().json(service.list_groups(&member.0).await?))
}

#[get("/groups/{group_id}")]
async fn get_group(service: Service, member: CurrentMember, group_id: web::Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(service.get_group(&member.0, &group_id).await?))
}

#[put("/groups/{group_id}")]
async fn rename_group(
    service: Service,
    member: CurrentMember,
    group_id: web::Path<String>,
    json: web::Json<GroupNameJson>,
) -> Response {
    let group = service
        .rename_group(&member.0, &group_id, json.into_inner().name)
        .await?;
    Ok(HttpResponse::Ok().json(group))
}

#[delete("/groups/{group_id}")]
async fn delete_group(service: Service, member: CurrentMember, group_id: web::Path<String>) -> Response {
    service.delete_group(&member.0, &group_id).await?;
    Ok(message("Group deleted successfully"))
}

#[post("/groups/{group_id}/members/{username}")]
async fn add_member(service: Service, member: CurrentMember, path: web::Path<(String, String)>) -> Response {
    let (group_id, username) = path.into_inner();
    service.add_member(&member.0, &group_id, &username).await?;
    Ok(message("Member added successfully"))
}

#[delete("/groups/{group_id}/members/{username}")]
async fn remove_member(service: Service, member: CurrentMember, path: web::Path<(String, String)>) -> Response {
    let (group_id, username) = path.into_inner();
    service.remove_member(&member.0, &group_id, &username).await?;
    Ok(message("Member removed successfully"))
}

// Expenses

#[post("/expenses")]
async fn create_expense(service: Service, member: CurrentMember, json: web::Json<NewExpense>) -> Response {
    let expense = service.create_expense(&member.0, json.into_inner()).await?;
    Ok(HttpResponse::Ok().json(expense))
}

#[get("/expenses/user/balances")]
async fn user_balances(service: Service, member: CurrentMember) -> Response {
    Ok(HttpResponse::Ok().json(service.user_balances(&member.0).await?))
}

#[get("/expenses/{group_id}")]
async fn list_expenses(service: Service, member: CurrentMember, group_id: web::Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(service.list_expenses(&member.0, &group_id).await?))
}

#[get("/expenses/{group_id}/balances")]
async fn group_balances(service: Service, member: CurrentMember, group_id: web::Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(service.group_balances(&member.0, &group_id).await?))
}

#[post("/expenses/{group_id}/settle")]
async fn settle(service: Service, member: CurrentMember, group_id: web::Path<String>) -> Response {
    Ok(HttpResponse::Ok().json(service.settle(&member.0, &group_id).await?))
}

#[get("/expenses/{group_id}/{expense_id}")]
async fn get_expense(service: Service, member: CurrentMember, path: web::Path<(String, String)>) -> Response {
    let (group_id, expense_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(service.get_expense(&member.0, &group_id, &expense_id).await?))
}

#[put("/expenses/{group_id}/{expense_id}")]
async fn update_expense(
    service: Service,
    member: CurrentMember,
    path: web::Path<(String, String)>,
    json: web::Json<ExpenseDraft>,
) -> Response {
    let (group_id, expense_id) = path.into_inner();
    let expense = service
        .update_expense(&member.0, &group_id, &expense_id, json.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(expense))
}

#[delete("/expenses/{group_id}/{expense_id}")]
async fn delete_expense(service: Service, member: CurrentMember, path: web::Path<(String, String)>) -> Response {
    let (group_id, expense_id) = path.into_inner();
    service.delete_expense(&member.0, &group_id, &expense_id).await?;
    Ok(message("Expense deleted successfully"))
}

/// Registers every route. The literal `balances`/`settle` paths come before
/// `{expense_id}` so they are not captured by it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root)
        .service(register_user)
        .service(login)
        .service(read_me)
        .service(update_me)
        .service(delete_me)
        .service(create_group)
        .service(list_groups)
        .service(get_group)
        .service(rename_group)
        .service(delete_group)
        .service(add_member)
        .service(remove_member)
        .service(create_expense)
        .service(user_balances)
        .service(group_balances)
        .service(settle)
        .service(list_expenses)
        .service(get_expense)
        .service(update_expense)
        .service(delete_expense);
}
