// src/common/i18n.rs

// Mensagens por idioma. "pt" é o idioma padrão e o fallback.
const PT: &[(&str, &str)] = &[
    ("erro.validacao", "Um ou mais campos são inválidos."),
    ("erro.nao_encontrado", "Recurso não encontrado."),
    ("erro.permissao", "Você não tem permissão para realizar esta ação."),
    ("erro.entidade", "Entidade desconhecida ou não suportada."),
    ("erro.parcial", "A operação foi concluída apenas parcialmente. Verifique os dados antes de repetir."),
    ("erro.email_existe", "Este e-mail já está em uso."),
    ("erro.credenciais", "E-mail ou senha inválidos."),
    ("erro.token", "Token de autenticação inválido ou ausente."),
    ("erro.usuario", "Usuário não encontrado."),
    ("erro.mensalidade", "Sua mensalidade está pendente. Regularize o pagamento para continuar."),
    ("erro.interno", "Ocorreu um erro inesperado."),
    ("required", "Campo obrigatório."),
    ("range", "Valor fora do intervalo permitido."),
    ("email", "E-mail inválido."),
    ("length", "Tamanho inválido."),
    ("venda.cliente_obrigatorio", "Por favor, selecione um cliente."),
    ("venda.carrinho_vazio", "O carrinho está vazio."),
    ("venda.item_invalido", "Adicione pelo menos um item válido com quantidade maior que zero."),
    ("venda.parcelas_obrigatorias", "Informe o número de parcelas do crediário."),
    ("venda.parcelas_limite", "O crediário aceita no máximo 120 parcelas."),
    ("venda.estoque_maximo", "Quantidade excede o estoque disponível."),
    ("venda.produto_inexistente", "Produto não encontrado."),
    ("cobranca.ja_paga", "Esta parcela já está paga."),
    ("cobranca.sem_telefone", "Este cliente não possui um número de telefone cadastrado para o WhatsApp."),
    ("recibo.parcela_nao_paga", "Selecione uma parcela paga."),
    ("nota.sem_itens", "Adicione pelo menos um item à nota."),
    ("nota.venda_obrigatoria", "Por favor, selecione uma venda."),
    ("mensalidade.ja_enviada", "Já existe um comprovante para este mês."),
    ("mensalidade.ja_revisada", "Este pagamento já foi revisado."),
    ("mensalidade.valor_indefinido", "O valor da mensalidade ainda não foi configurado."),
    ("suporte.conversa_fechada", "Esta conversa já foi encerrada."),
    ("suporte.ticket_resolvido", "Este ticket já foi resolvido."),
    ("importacao.falhou", "A extração dos dados não foi concluída."),
    ("importacao.vazia", "Nenhum registro para importar."),
    ("relatorio.tipo_invalido", "Tipo de relatório inválido."),
];

const EN: &[(&str, &str)] = &[
    ("erro.validacao", "One or more fields are invalid."),
    ("erro.nao_encontrado", "Resource not found."),
    ("erro.permissao", "You are not allowed to perform this action."),
    ("erro.entidade", "Unknown or unsupported entity."),
    ("erro.parcial", "The operation was only partially applied. Check the data before retrying."),
    ("erro.email_existe", "This e-mail is already in use."),
    ("erro.credenciais", "Invalid e-mail or password."),
    ("erro.token", "Invalid or missing authentication token."),
    ("erro.usuario", "User not found."),
    ("erro.mensalidade", "Your monthly fee is overdue. Please settle it to continue."),
    ("erro.interno", "An unexpected error occurred."),
    ("required", "Required field."),
    ("range", "Value out of range."),
    ("email", "Invalid e-mail."),
    ("length", "Invalid length."),
    ("venda.cliente_obrigatorio", "Please select a client."),
    ("venda.carrinho_vazio", "The cart is empty."),
    ("venda.item_invalido", "Add at least one valid item with quantity greater than zero."),
    ("venda.parcelas_obrigatorias", "Inform the number of installments."),
    ("venda.parcelas_limite", "Installment sales accept at most 120 installments."),
    ("venda.estoque_maximo", "Quantity exceeds available stock."),
    ("venda.produto_inexistente", "Product not found."),
    ("cobranca.ja_paga", "This installment is already paid."),
    ("cobranca.sem_telefone", "This client has no phone number registered for WhatsApp."),
    ("recibo.parcela_nao_paga", "Select a paid installment."),
    ("nota.sem_itens", "Add at least one item to the note."),
    ("nota.venda_obrigatoria", "Please select a sale."),
    ("mensalidade.ja_enviada", "A proof of payment already exists for this month."),
    ("mensalidade.ja_revisada", "This payment was already reviewed."),
    ("mensalidade.valor_indefinido", "The monthly fee amount has not been configured yet."),
    ("suporte.conversa_fechada", "This conversation is closed."),
    ("suporte.ticket_resolvido", "This ticket is already resolved."),
    ("importacao.falhou", "Data extraction did not complete."),
    ("importacao.vazia", "No records to import."),
    ("relatorio.tipo_invalido", "Invalid report type."),
];

#[derive(Debug, Clone, Default)]
pub struct I18nStore;

impl I18nStore {
    pub fn translate(&self, lang: &str, key: &str) -> String {
        let table = match lang {
            "en" => EN,
            _ => PT,
        };

        lookup(table, key)
            .or_else(|| lookup(PT, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore;
        assert_eq!(store.translate("fr", "venda.carrinho_vazio"), "O carrinho está vazio.");
    }

    #[test]
    fn unknown_key_is_returned_as_is() {
        assert_eq!(I18nStore.translate("pt", "nao.existe"), "nao.existe");
    }

    #[test]
    fn every_portuguese_key_has_an_english_counterpart() {
        for (key, _) in PT {
            assert!(lookup(EN, key).is_some(), "faltando tradução para {key}");
        }
    }
}
