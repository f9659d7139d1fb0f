// tests/api.rs
//
// Testes de ponta a ponta do router, sobre o entity store em memória.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gestao_pro::{
    config::{AppConfig, AppState},
    routes::app_router,
};

const ADMIN_EMAIL: &str = "admin@gestao.com";

fn app() -> Router {
    let config = AppConfig::for_tests(&[ADMIN_EMAIL]);
    app_router(AppState::in_memory(&config))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn registrar(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "senha-forte",
            "full_name": "Maria Souza",
            "aceitou_termos": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_responde_ok() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn sem_token_responde_401_no_idioma_do_cliente() {
    let app = app();

    let (status, body) = call(&app, "GET", "/api/clientes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token de autenticação inválido ou ausente.");

    let request = Request::builder()
        .uri("/api/clientes")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid or missing authentication token.");
}

#[tokio::test]
async fn email_repetido_responde_409() {
    let app = app();
    registrar(&app, "loja@exemplo.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "LOJA@exemplo.com",
            "password": "outra-senha",
            "full_name": "Outra Pessoa"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn venda_no_crediario_gera_parcelas_e_baixa_estoque() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, cliente) = call(
        &app,
        "POST",
        "/api/clientes",
        Some(&token),
        Some(json!({ "nome_completo": "João da Silva", "telefone": "11999998888" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{cliente}");

    let (status, produto) = call(
        &app,
        "POST",
        "/api/produtos",
        Some(&token),
        Some(json!({ "nome_produto": "Camiseta", "preco_venda": 150.0, "quantidade_estoque": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{produto}");
    let produto_id = produto["id"].as_str().unwrap().to_string();

    let (status, registrada) = call(
        &app,
        "POST",
        "/api/vendas",
        Some(&token),
        Some(json!({
            "cliente_id": cliente["id"],
            "itens": [{ "produto_id": produto_id, "quantidade": 2 }],
            "forma_pagamento": "crediario",
            "quantidade_parcelas": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{registrada}");
    assert_eq!(registrada["parcelas"], 3);
    assert_eq!(registrada["venda"]["valor_total"].as_f64(), Some(300.0));
    assert_eq!(registrada["venda"]["status"], "pendente");

    let (status, pagina) = call(&app, "GET", "/api/cobrancas", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pagina["total"], 3);

    let (_, produtos) = call(&app, "GET", "/api/produtos", Some(&token), None).await;
    let camiseta = produtos
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == produto_id.as_str())
        .unwrap();
    assert_eq!(camiseta["quantidade_estoque"], 8);
}

#[tokio::test]
async fn venda_acima_do_estoque_e_recusada() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (_, produto) = call(
        &app,
        "POST",
        "/api/produtos",
        Some(&token),
        Some(json!({ "nome_produto": "Boné", "preco_venda": 40.0, "quantidade_estoque": 1 })),
    )
    .await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/vendas",
        Some(&token),
        Some(json!({
            "itens": [{ "produto_id": produto["id"], "quantidade": 5 }],
            "forma_pagamento": "pix"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mensalidade_pendente_bloqueia_rotas_de_negocio() {
    let app = app();
    let admin = registrar(&app, ADMIN_EMAIL).await;
    let token = registrar(&app, "loja@exemplo.com").await;

    let (_, perfil) = call(&app, "GET", "/api/users/me", Some(&token), None).await;
    let usuario_id = perfil["id"].as_str().unwrap().to_string();

    let (status, atualizado) = call(
        &app,
        "PATCH",
        &format!("/api/admin/usuarios/{}", usuario_id),
        Some(&admin),
        Some(json!({ "status": "inativo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{atualizado}");
    assert_eq!(atualizado["status"], "inativo");

    let (status, body) = call(&app, "GET", "/api/clientes", Some(&token), None).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        body["error"],
        "Sua mensalidade está pendente. Regularize o pagamento para continuar."
    );

    // A tela de mensalidade continua acessível
    let (status, situacao) = call(&app, "GET", "/api/mensalidade/status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(situacao["em_dia"], false);

    let (status, pagamento) = call(
        &app,
        "POST",
        "/api/mensalidade",
        Some(&token),
        Some(json!({ "comprovante_url": "https://arquivos.exemplo.com/pix.png", "valor": 49.9 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{pagamento}");
    assert_eq!(pagamento["status"], "aguardando_verificacao");

    let (status, _) = call(&app, "GET", "/api/clientes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn console_admin_exige_papel_de_admin() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, body) = call(&app, "GET", "/api/admin/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Você não tem permissão para realizar esta ação.");

    let admin = registrar(&app, ADMIN_EMAIL).await;
    let (status, _) = call(&app, "GET", "/api/admin/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_invalida_o_token() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, _) = call(&app, "POST", "/api/users/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn importacao_e_relatorio_rejeitam_nomes_desconhecidos() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/import/Fornecedor",
        Some(&token),
        Some(json!({ "status": "success", "output": { "registros": [{ "nome": "X" }] } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resultado) = call(
        &app,
        "POST",
        "/api/import/cliente",
        Some(&token),
        Some(json!({
            "status": "success",
            "output": { "registros": [{ "nome_completo": "Ana" }, { "nome_completo": "Bruno" }] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{resultado}");
    assert_eq!(resultado["importados"], 2);

    let (status, _) = call(&app, "GET", "/api/relatorios/estoque_magico", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, relatorio) = call(&app, "GET", "/api/relatorios/clientes-ativos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(relatorio["total_registros"], 2);
}

#[tokio::test]
async fn pagina_de_cobrancas_fora_do_intervalo_responde_400() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, body) = call(
        &app,
        "GET",
        "/api/cobrancas?pagina=9223372036854775807",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = call(&app, "GET", "/api/cobrancas?pagina=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_ve_a_ficha_completa_de_uma_conta() {
    let app = app();
    let admin = registrar(&app, ADMIN_EMAIL).await;
    let token = registrar(&app, "loja@exemplo.com").await;

    let (_, perfil) = call(&app, "GET", "/api/users/me", Some(&token), None).await;
    let usuario_id = perfil["id"].as_str().unwrap().to_string();
    let uri = format!("/api/admin/usuarios/{}", usuario_id);

    let (status, _) = call(
        &app,
        "POST",
        "/api/clientes",
        Some(&token),
        Some(json!({ "nome_completo": "João da Silva" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &app,
        "POST",
        "/api/mensalidade",
        Some(&token),
        Some(json!({ "comprovante_url": "https://arquivos.exemplo.com/pix.png", "valor": 49.9 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Clientes de outra conta não aparecem na ficha
    let (status, _) = call(
        &app,
        "POST",
        "/api/clientes",
        Some(&admin),
        Some(json!({ "nome_completo": "Cliente do Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, ficha) = call(&app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "{ficha}");
    assert_eq!(ficha["usuario"]["email"], "loja@exemplo.com");
    assert_eq!(ficha["clientes"].as_array().unwrap().len(), 1);
    assert_eq!(ficha["clientes"][0]["nome_completo"], "João da Silva");
    assert_eq!(ficha["vendas"], json!([]));
    assert_eq!(ficha["pagamentos"].as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let desconhecido = format!("/api/admin/usuarios/{}", uuid::Uuid::new_v4());
    let (status, _) = call(&app, "GET", &desconhecido, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relatorio_de_produtos_aceita_o_nome_longo() {
    let app = app();
    let token = registrar(&app, "loja@exemplo.com").await;

    let (status, curto) = call(&app, "GET", "/api/relatorios/produtos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{curto}");
    let (status, longo) =
        call(&app, "GET", "/api/relatorios/produtos_mais_vendidos", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{longo}");
    assert_eq!(curto["dados"]["tipo"], "produtos");
    assert_eq!(longo["dados"]["tipo"], "produtos");
}
