// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::update_me,
        handlers::auth::logout,

        // --- Clientes ---
        handlers::crm::list_clientes,
        handlers::crm::create_cliente,
        handlers::crm::get_cliente,
        handlers::crm::update_cliente,
        handlers::crm::get_historico,

        // --- INVENTORY ---
        handlers::inventory::list_produtos,
        handlers::inventory::create_produto,
        handlers::inventory::update_produto,
        handlers::inventory::ajustar_estoque,
        handlers::inventory::list_movimentacoes,
        handlers::inventory::list_estoque_baixo,

        // --- Vendas ---
        handlers::sales::list_vendas,
        handlers::sales::get_venda,
        handlers::sales::registrar_venda,
        handlers::sales::preview_carrinho,

        // --- Cobranças ---
        handlers::billing::list_cobrancas,
        handlers::billing::get_resumo,
        handlers::billing::pagar_parcela,
        handlers::billing::get_lembrete,

        // --- Documentos ---
        handlers::documents::list_notas,
        handlers::documents::emitir_nota,
        handlers::documents::pdf_nota,
        handlers::documents::list_recibos,
        handlers::documents::emitir_recibo,
        handlers::documents::pdf_recibo,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Dashboard ---
        handlers::dashboard::get_resumo,
        handlers::dashboard::get_vendas_mensais,
        handlers::dashboard::get_top_produtos,
        handlers::dashboard::get_relatorio,

        // --- Mensalidade ---
        handlers::subscription::list_pagamentos,
        handlers::subscription::enviar_comprovante,
        handlers::subscription::get_status,

        // --- Suporte ---
        handlers::support::abrir_conversa,
        handlers::support::list_mensagens,
        handlers::support::enviar_mensagem,
        handlers::support::abrir_ticket,

        // --- Importação ---
        handlers::import::importar,

        // --- Admin ---
        handlers::admin::get_dashboard,
        handlers::admin::list_inadimplentes,
        handlers::admin::list_pagamentos,
        handlers::admin::revisar_pagamento,
        handlers::admin::list_conversas,
        handlers::admin::fechar_conversa,
        handlers::admin::list_tickets,
        handlers::admin::resolver_ticket,
        handlers::admin::list_usuarios,
        handlers::admin::get_usuario,
        handlers::admin::update_usuario,
        handlers::admin::list_configuracoes_publicas,
        handlers::admin::definir_configuracao_publica,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserStatus,
            models::auth::UserProfile,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateMePayload,
            models::auth::AdminUpdateUserPayload,

            // --- Clientes ---
            models::crm::ClienteStatus,
            models::crm::Cliente,
            models::crm::NovoCliente,
            models::crm::AtualizarCliente,
            models::crm::ClienteHistorico,

            // --- Inventory ---
            models::inventory::ProdutoStatus,
            models::inventory::Produto,
            models::inventory::NovoProduto,
            models::inventory::AtualizarProduto,
            models::inventory::TipoMovimentacao,
            models::inventory::MovimentacaoEstoque,
            models::inventory::AjusteEstoquePayload,

            // --- Vendas ---
            models::sales::FormaPagamento,
            models::sales::VendaStatus,
            models::sales::ItemVenda,
            models::sales::Venda,
            models::sales::ItemCarrinhoPayload,
            models::sales::RegistrarVendaPayload,
            models::sales::CarrinhoResumo,
            models::sales::LinhaCarrinho,
            models::sales::VendaRegistrada,

            // --- Cobranças ---
            models::billing::ParcelaStatus,
            models::billing::StatusDerivado,
            models::billing::Parcela,
            models::billing::ClienteRef,
            models::billing::NovaParcela,
            models::billing::Cobranca,
            models::billing::FiltroCobranca,
            models::billing::PaginaCobrancas,
            models::billing::TotalizadorCobranca,
            models::billing::ResumoCobrancas,
            models::billing::PagarParcelaPayload,
            models::billing::LembreteWhatsApp,

            // --- Documentos ---
            models::documents::ItemNota,
            models::documents::NotaServico,
            models::documents::Recibo,
            models::documents::ItemNotaPayload,
            models::documents::EmitirNotaPayload,
            models::documents::EmitirReciboPayload,

            // --- Settings ---
            models::settings::Configuracao,
            models::settings::AtualizarConfiguracao,
            models::settings::ConfiguracaoPublica,
            models::settings::DefinirConfiguracaoPublica,

            // --- DASHBOARD ---
            models::dashboard::DashboardResumo,
            models::dashboard::VendasMes,
            models::dashboard::TopProduto,
            models::dashboard::RankingCliente,
            models::dashboard::AdminDashboard,
            models::dashboard::UsuarioDetalhes,
            models::dashboard::TipoRelatorio,
            models::dashboard::DadosRelatorio,
            models::dashboard::Relatorio,

            // --- Mensalidade ---
            models::subscription::PagamentoStatus,
            models::subscription::Pagamento,
            models::subscription::EnviarComprovantePayload,
            models::subscription::DecisaoRevisao,
            models::subscription::RevisarPagamentoPayload,
            models::subscription::StatusMensalidade,
            models::subscription::Inadimplente,

            // --- Suporte ---
            models::support::ConversaStatus,
            models::support::Remetente,
            models::support::ChatConversa,
            models::support::ChatMessage,
            models::support::AbrirConversaPayload,
            models::support::EnviarMensagemPayload,
            models::support::ConversaAberta,
            models::support::Prioridade,
            models::support::TicketStatus,
            models::support::SuporteTicket,
            models::support::AbrirTicketPayload,
            models::support::ResolverTicketPayload,

            // --- Importação ---
            crate::db::EntityKind,
            models::import::ImportacaoPayload,
            models::import::SaidaExtracao,
            models::import::ImportacaoResultado,
        )
    ),
    tags(
        (name = "Health", description = "Verificação do servidor"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Clientes", description = "Cadastro e histórico de clientes"),
        (name = "Inventory", description = "Produtos e movimentações de estoque"),
        (name = "Vendas", description = "Carrinho e registro de vendas"),
        (name = "Cobranças", description = "Parcelas do crediário"),
        (name = "Documentos", description = "Notas de serviço e recibos em PDF"),
        (name = "Configurações", description = "Dados da empresa"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Relatórios", description = "Relatórios da conta"),
        (name = "Mensalidade", description = "Pagamento da mensalidade da plataforma"),
        (name = "Suporte", description = "Chat e tickets de suporte"),
        (name = "Importação", description = "Importação de dados extraídos"),
        (name = "Admin", description = "Console do administrador")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_routes_and_bearer_scheme() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("/api/cobrancas/{id}/pagar"));
        assert!(json.contains("/api/admin/pagamentos/{id}/revisar"));
        assert!(json.contains("api_jwt"));
    }
}
