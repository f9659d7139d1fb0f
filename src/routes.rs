// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, subscription::subscription_guard},
};

/// Monta o router completo da API.
pub fn app_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me).patch(handlers::auth::update_me))
        .route("/logout", post(handlers::auth::logout));

    // Mensalidade e suporte ficam acessíveis mesmo com a mensalidade pendente
    let account_routes = Router::new()
        .route(
            "/mensalidade",
            get(handlers::subscription::list_pagamentos).post(handlers::subscription::enviar_comprovante),
        )
        .route("/mensalidade/status", get(handlers::subscription::get_status))
        .route("/suporte/conversas", post(handlers::support::abrir_conversa))
        .route(
            "/suporte/conversas/{id}/mensagens",
            get(handlers::support::list_mensagens).post(handlers::support::enviar_mensagem),
        )
        .route("/suporte/tickets", post(handlers::support::abrir_ticket));

    // Rotas de negócio: exigem a mensalidade em dia
    let business_routes = Router::new()
        // Clientes
        .route(
            "/clientes",
            get(handlers::crm::list_clientes).post(handlers::crm::create_cliente),
        )
        .route(
            "/clientes/{id}",
            get(handlers::crm::get_cliente).put(handlers::crm::update_cliente),
        )
        .route("/clientes/{id}/historico", get(handlers::crm::get_historico))
        // Produtos e estoque
        .route(
            "/produtos",
            get(handlers::inventory::list_produtos).post(handlers::inventory::create_produto),
        )
        .route("/produtos/estoque-baixo", get(handlers::inventory::list_estoque_baixo))
        .route("/produtos/{id}", put(handlers::inventory::update_produto))
        .route("/produtos/{id}/ajuste", post(handlers::inventory::ajustar_estoque))
        .route("/produtos/{id}/movimentacoes", get(handlers::inventory::list_movimentacoes))
        // Vendas
        .route(
            "/vendas",
            get(handlers::sales::list_vendas).post(handlers::sales::registrar_venda),
        )
        .route("/vendas/carrinho", post(handlers::sales::preview_carrinho))
        .route("/vendas/{id}", get(handlers::sales::get_venda))
        // Cobranças
        .route("/cobrancas", get(handlers::billing::list_cobrancas))
        .route("/cobrancas/resumo", get(handlers::billing::get_resumo))
        .route("/cobrancas/{id}/pagar", post(handlers::billing::pagar_parcela))
        .route("/cobrancas/{id}/lembrete", get(handlers::billing::get_lembrete))
        // Documentos
        .route(
            "/documentos/notas",
            get(handlers::documents::list_notas).post(handlers::documents::emitir_nota),
        )
        .route("/documentos/notas/{id}/pdf", get(handlers::documents::pdf_nota))
        .route(
            "/documentos/recibos",
            get(handlers::documents::list_recibos).post(handlers::documents::emitir_recibo),
        )
        .route("/documentos/recibos/{id}/pdf", get(handlers::documents::pdf_recibo))
        // Configurações da empresa
        .route(
            "/configuracoes",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        // Dashboard e relatórios
        .route("/dashboard/resumo", get(handlers::dashboard::get_resumo))
        .route("/dashboard/vendas-mensais", get(handlers::dashboard::get_vendas_mensais))
        .route("/dashboard/top-produtos", get(handlers::dashboard::get_top_produtos))
        .route("/relatorios/{tipo}", get(handlers::dashboard::get_relatorio))
        // Importação
        .route("/import/{entity}", post(handlers::import::importar))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            subscription_guard,
        ));

    // Console do admin (o papel é conferido em cada handler)
    let admin_routes = Router::new()
        .route("/dashboard", get(handlers::admin::get_dashboard))
        .route("/inadimplentes", get(handlers::admin::list_inadimplentes))
        .route("/pagamentos", get(handlers::admin::list_pagamentos))
        .route("/pagamentos/{id}/revisar", post(handlers::admin::revisar_pagamento))
        .route("/conversas", get(handlers::admin::list_conversas))
        .route("/conversas/{id}/fechar", post(handlers::admin::fechar_conversa))
        .route("/tickets", get(handlers::admin::list_tickets))
        .route("/tickets/{id}/resolver", post(handlers::admin::resolver_ticket))
        .route("/usuarios", get(handlers::admin::list_usuarios))
        .route(
            "/usuarios/{id}",
            get(handlers::admin::get_usuario).patch(handlers::admin::update_usuario),
        )
        .route(
            "/configuracoes-publicas",
            get(handlers::admin::list_configuracoes_publicas)
                .put(handlers::admin::definir_configuracao_publica),
        );

    // Tudo abaixo de /api (exceto auth e health) passa pelo auth_guard
    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/admin", admin_routes)
        .merge(account_routes)
        .merge(business_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
