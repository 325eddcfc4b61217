use crate::account::{AccountStore, FirebaseClient};
use crate::filter::year_choices;
use crate::navigation::{NavigationPolicy, Screen};
use crate::screens::{
    MovieDetails, Outcome, ProfileScreen, SignInForm, SignUpForm, SuggestionsScreen,
    ACCOUNT_CREATED,
};
use crate::tmdb::{CatalogApi, TmdbClient};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const ROOT_SWITCH_TIMEOUT: Duration = Duration::from_secs(5);

const HELP_SIGNED_OUT: &str = "\
Comandos:
  login <email> <senha>
  register <nome>;<email>;<senha>;<confirmar senha>;<telefone>;<endereço>
  help | quit";

const HELP_SIGNED_IN: &str = "\
Comandos:
  search <texto>          busca rápida
  clear                   limpa a busca
  genres                  lista os gêneros
  filters [genre=<id>] [year=<aaaa>] [rating=<0-10>]
  discover                busca sugestões com os filtros
  details <n>             detalhes do filme n da lista
  profile                 mostra o perfil
  edit <name|phone|address> <valor>
  save | cancel           salva ou descarta a edição do perfil
  logout
  help | quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Login(SignInForm),
    Register(SignUpForm),
    Search(String),
    Clear,
    Genres,
    Filters(Vec<(String, String)>),
    Discover,
    Details(usize),
    Profile,
    Edit { field: String, value: String },
    Save,
    Cancel,
    Logout,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match verb.to_lowercase().as_str() {
            "login" => {
                let mut parts = rest.split_whitespace();
                Command::Login(SignInForm {
                    email: parts.next().unwrap_or_default().to_string(),
                    password: parts.next().unwrap_or_default().to_string(),
                })
            }
            "register" => Command::Register(SignUpForm::parse(rest)),
            "search" => Command::Search(rest.to_string()),
            "clear" => Command::Clear,
            "genres" => Command::Genres,
            "filters" => Command::Filters(
                rest.split_whitespace()
                    .map(|pair| {
                        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                        (k.to_lowercase(), v.to_string())
                    })
                    .collect(),
            ),
            "discover" => Command::Discover,
            "details" => match rest.parse::<usize>() {
                Ok(n) if n > 0 => Command::Details(n),
                _ => return Err("Uso: details <n>".to_string()),
            },
            "profile" => Command::Profile,
            "edit" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Command::Edit {
                    field: field.to_lowercase(),
                    value: value.trim().to_string(),
                }
            }
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "logout" => Command::Logout,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Comando desconhecido: {other}")),
        };
        Ok(Some(command))
    }

    /// Screen the command belongs to; `None` for commands available everywhere.
    fn screen(&self) -> Option<Screen> {
        match self {
            Command::Login(_) => Some(Screen::SignIn),
            Command::Register(_) => Some(Screen::SignUp),
            Command::Search(_)
            | Command::Clear
            | Command::Genres
            | Command::Filters(_)
            | Command::Discover
            | Command::Details(_) => Some(Screen::SuggestionsHome),
            Command::Profile
            | Command::Edit { .. }
            | Command::Save
            | Command::Cancel
            | Command::Logout => Some(Screen::Profile),
            Command::Help | Command::Quit => None,
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

struct App<W> {
    catalog: Arc<dyn CatalogApi>,
    store: Arc<dyn AccountStore>,
    policy: NavigationPolicy,
    suggestions: SuggestionsScreen,
    profile: ProfileScreen,
    out: W,
}

pub async fn run() -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_env()?);
    let store: Arc<dyn AccountStore> = Arc::new(FirebaseClient::from_env()?);
    let input = BufReader::new(tokio::io::stdin());

    tokio::select! {
        res = run_session(catalog, store, input, tokio::io::stdout()) => res,
        _ = shutdown_signal() => Ok(()),
    }
}

/// Drives the screens from line-oriented input until EOF or `quit`.
pub async fn run_session<R, W>(
    catalog: Arc<dyn CatalogApi>,
    store: Arc<dyn AccountStore>,
    input: R,
    out: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let policy = NavigationPolicy::attach(store.subscribe());
    let mut app = App {
        suggestions: SuggestionsScreen::new(catalog.clone()),
        profile: ProfileScreen::new(store.clone()),
        catalog,
        store,
        policy,
        out,
    };

    if app.policy.state().is_authenticated() {
        app.enter_home().await?;
    } else {
        app.say("Bem-vindo! Faça login ou crie uma conta.").await?;
        app.say(HELP_SIGNED_OUT).await?;
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if let Flow::Quit = app.handle(&line).await? {
            break;
        }
    }

    app.policy.detach();
    info!("Session ended");
    Ok(())
}

impl<W: AsyncWrite + Unpin> App<W> {
    async fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        self.out.write_all(text.as_ref().as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn handle(&mut self, line: &str) -> Result<Flow> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(message) => {
                self.say(message).await?;
                return Ok(Flow::Continue);
            }
        };

        if let Some(screen) = command.screen() {
            if !self.policy.can_visit(screen) {
                debug!("Blocked {:?} while on {:?}", screen, self.policy.state());
                let message = if self.policy.state().is_authenticated() {
                    "Você já está conectado. Use logout para sair."
                } else {
                    "Faça login para continuar."
                };
                self.say(message).await?;
                return Ok(Flow::Continue);
            }
        }

        match command {
            Command::Login(form) => match form.submit(&self.store).await {
                Ok(()) => self.enter_home().await?,
                Err(message) => self.say(format!("Erro: {message}")).await?,
            },
            Command::Register(form) => {
                match form.submit(&self.store).await {
                    Ok(_) => self.say(ACCOUNT_CREATED).await?,
                    Err(message) => self.say(format!("Erro: {message}")).await?,
                }
                // A failed profile write still leaves the new account signed in.
                if self.store.current_session().is_some() {
                    self.enter_home().await?;
                }
            }
            Command::Search(query) => {
                let outcome = self.suggestions.quick_search(&query).await;
                self.show_outcome(outcome).await?;
            }
            Command::Clear => {
                self.suggestions.clear_search().await;
                self.say("Busca limpa.").await?;
            }
            Command::Genres => self.show_genres().await?,
            Command::Filters(pairs) => self.apply_filters(pairs).await?,
            Command::Discover => {
                let outcome = self.suggestions.search_with_filters().await;
                self.show_outcome(outcome).await?;
            }
            Command::Details(n) => {
                let state = self.suggestions.snapshot().await;
                match state.visible_movies().get(n - 1) {
                    Some(movie) => {
                        let details = MovieDetails::from(*movie);
                        self.say(details.render()).await?;
                    }
                    None => self.say(format!("Não há filme {n} na lista.")).await?,
                }
            }
            Command::Profile => {
                self.profile.load().await;
                self.show_profile().await?;
            }
            Command::Edit { field, value } => self.edit_profile(&field, value).await?,
            Command::Save => {
                self.profile.save().await;
                self.flush_profile_message().await?;
            }
            Command::Cancel => {
                self.profile.cancel().await;
                self.flush_profile_message().await?;
                self.show_profile().await?;
            }
            Command::Logout => {
                if self.profile.sign_out().await {
                    self.reset_screens();
                    self.await_root(false).await;
                    self.say("Você saiu da sua conta.").await?;
                } else {
                    self.flush_profile_message().await?;
                }
            }
            Command::Help => {
                let help = if self.policy.state().is_authenticated() {
                    HELP_SIGNED_IN
                } else {
                    HELP_SIGNED_OUT
                };
                self.say(help).await?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    async fn await_root(&self, authenticated: bool) -> bool {
        let mut state = self.policy.watch();
        let switched = matches!(
            tokio::time::timeout(
                ROOT_SWITCH_TIMEOUT,
                state.wait_for(|s| s.is_authenticated() == authenticated),
            )
            .await,
            Ok(Ok(_))
        );
        if !switched {
            warn!("Navigation did not switch (authenticated = {})", authenticated);
        }
        switched
    }

    async fn enter_home(&mut self) -> Result<()> {
        if !self.await_root(true).await {
            return Ok(());
        }
        self.reset_screens();
        self.suggestions.load_genres().await;
        self.say("Sugestões").await?;
        self.say(HELP_SIGNED_IN).await
    }

    /// Screen state lives only as long as one signed-in session.
    fn reset_screens(&mut self) {
        self.suggestions = SuggestionsScreen::new(self.catalog.clone());
        self.profile = ProfileScreen::new(self.store.clone());
    }

    async fn show_outcome(&mut self, outcome: Outcome) -> Result<()> {
        if let Outcome::Skipped | Outcome::Stale = outcome {
            return Ok(());
        }
        let state = self.suggestions.snapshot().await;
        if let Some(advisory) = &state.advisory {
            return self.say(format!("Aviso: {advisory}")).await;
        }
        let lines: Vec<String> = state
            .visible_movies()
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    "{:>2}. {} ({}) ⭐ {:.1}",
                    i + 1,
                    m.title,
                    m.release_year().unwrap_or("N/A"),
                    m.vote_average
                )
            })
            .collect();
        self.say(lines.join("\n")).await
    }

    async fn show_genres(&mut self) -> Result<()> {
        let mut state = self.suggestions.snapshot().await;
        if state.genres.is_empty() {
            self.suggestions.load_genres().await;
            state = self.suggestions.snapshot().await;
        }
        let lines: Vec<String> = std::iter::once("Todos: genre=".to_string())
            .chain(
                state
                    .genres
                    .iter()
                    .map(|g| format!("{}: genre={}", g.name, g.id)),
            )
            .collect();
        self.say(lines.join("\n")).await
    }

    async fn apply_filters(&mut self, pairs: Vec<(String, String)>) -> Result<()> {
        if let Some((key, _)) = pairs
            .iter()
            .find(|(k, _)| !matches!(k.as_str(), "genre" | "year" | "rating"))
        {
            return self.say(format!("Filtro desconhecido: {key}")).await;
        }
        let show_years = pairs.is_empty();
        let years = year_choices();
        self.suggestions
            .update_filter(|filter| {
                for (key, value) in pairs {
                    match key.as_str() {
                        "genre" => filter.genre = value,
                        "year" => filter.year = value,
                        _ => filter.rating_text = value,
                    }
                }
            })
            .await;
        if let (Some(newest), Some(oldest)) = (years.first(), years.last()) {
            if show_years {
                self.say(format!("Anos disponíveis: {oldest} a {newest}")).await?;
            }
        }
        let filter = self.suggestions.snapshot().await.filter;
        let shown = |v: &str| if v.is_empty() { "Todos".to_string() } else { v.to_string() };
        let rating = match filter.min_rating() {
            Some(r) => r.to_string(),
            None => "sem filtro".to_string(),
        };
        self.say(format!(
            "Gênero: {} | Ano: {} | Avaliação mínima: {}",
            shown(&filter.genre),
            shown(&filter.year),
            rating
        ))
        .await
    }

    async fn edit_profile(&mut self, field: &str, value: String) -> Result<()> {
        if self.profile.profile().id.is_empty() {
            self.profile.load().await;
        }
        self.profile.start_editing();
        let profile = self.profile.profile_mut();
        match field {
            "name" => profile.name = value,
            "phone" => profile.phone = value,
            "address" => profile.address = value,
            "email" => return self.say("O email não pode ser alterado.").await,
            other => return self.say(format!("Campo desconhecido: {other}")).await,
        }
        self.say("Alteração pendente. Use save para salvar ou cancel para descartar.")
            .await
    }

    async fn show_profile(&mut self) -> Result<()> {
        self.flush_profile_message().await?;
        let p = self.profile.profile().clone();
        self.say(format!(
            "Nome: {}\nEmail: {}\nTelefone: {}\nEndereço: {}",
            p.name, p.email, p.phone, p.address
        ))
        .await
    }

    async fn flush_profile_message(&mut self) -> Result<()> {
        match self.profile.take_message() {
            Some(message) => self.say(message).await,
            None => Ok(()),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
