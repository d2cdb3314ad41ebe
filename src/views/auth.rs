use super::escape_opt;
use crate::models::Profile;

pub fn login() -> String {
    r#"<h1>Connexion</h1>
<form method="post" action="/auth/login" class="card">
<label>Email<input type="email" name="email" required autocomplete="email"></label>
<label>Mot de passe<input type="password" name="password" required autocomplete="current-password"></label>
<button type="submit">Se connecter</button>
</form>
<p>Pas encore de compte ? <a href="/auth/register">Inscription</a></p>"#
        .to_string()
}

pub fn register() -> String {
    r#"<h1>Inscription</h1>
<form method="post" action="/auth/register" class="card">
<label>Email<input type="email" name="email" required autocomplete="email"></label>
<label>Mot de passe<input type="password" name="password" required minlength="6" autocomplete="new-password"></label>
<button type="submit">Créer mon compte</button>
</form>
<p>Déjà inscrit ? <a href="/auth/login">Connexion</a></p>"#
        .to_string()
}

/// Profile setup, pre-filled when the profile exists. The phone is entered as
/// country code plus local number and stored in E.164.
pub fn profile_setup(profile: Option<&Profile>) -> String {
    let current_phone = profile
        .and_then(|p| p.telephone.as_deref())
        .map(|t| format!(r#"<p class="muted">Téléphone actuel: {}</p>"#, super::escape(t)))
        .unwrap_or_default();
    format!(
        r#"<h1>Mon profil</h1>
{current_phone}
<form method="post" action="/profile/setup" class="card">
<label>Nom<input name="nom" required value="{nom}"></label>
<label>Prénom<input name="prenom" required value="{prenom}"></label>
<label>Indicatif<input name="countryCode" placeholder="+33"></label>
<label>Numéro<input name="phoneNumber" placeholder="6 12 34 56 78"></label>
<label>Avatar (URL)<input name="avatarUrl" type="url" value="{avatar}"></label>
<button type="submit">Enregistrer</button>
</form>"#,
        nom = escape_opt(profile.and_then(|p| p.nom.as_deref())),
        prenom = escape_opt(profile.and_then(|p| p.prenom.as_deref())),
        avatar = escape_opt(profile.and_then(|p| p.avatar_url.as_deref())),
    )
}
