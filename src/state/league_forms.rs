//! The two Leagues-tab forms: creating a league and editing who plays in one.

use trufan_api::{League, LeagueMember, NewLeague};

pub const MAX_LEAGUE_NAME: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateField {
    #[default]
    Name,
    Description,
    Tournament,
}

impl CreateField {
    pub fn label(self) -> &'static str {
        match self {
            CreateField::Name => "League name",
            CreateField::Description => "Description",
            CreateField::Tournament => "Tournament",
        }
    }

    fn next(self) -> Self {
        match self {
            CreateField::Name => CreateField::Description,
            CreateField::Description => CreateField::Tournament,
            CreateField::Tournament => CreateField::Name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLeagueForm {
    pub name: String,
    pub description: String,
    pub tournament: String,
    pub field: CreateField,
}

impl CreateLeagueForm {
    pub fn new(tournament: &str) -> Self {
        Self { tournament: tournament.to_owned(), ..Self::default() }
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
    }

    fn current_mut(&mut self) -> &mut String {
        match self.field {
            CreateField::Name => &mut self.name,
            CreateField::Description => &mut self.description,
            CreateField::Tournament => &mut self.tournament,
        }
    }

    pub fn push(&mut self, c: char) {
        self.current_mut().push(c);
    }

    pub fn pop(&mut self) {
        self.current_mut().pop();
    }

    /// League names are up to 20 letters, digits and dashes.
    pub fn to_new_league(&self, user: &str) -> Result<NewLeague, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("League name is required");
        }
        if name.chars().count() > MAX_LEAGUE_NAME
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err("Use up to 20 letters, numbers and dashes");
        }
        let tournament = self.tournament.trim();
        if tournament.is_empty() {
            return Err("Tournament is required");
        }
        Ok(NewLeague {
            league_name: name.to_owned(),
            description: self.description.trim().to_owned(),
            tournament: tournament.to_owned(),
            user_id: user.to_owned(),
        })
    }
}

/// Member list of one league, admin first. The admin cannot be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersForm {
    pub league: League,
    pub members: Vec<String>,
    pub input: String,
    pub selected: usize,
}

impl MembersForm {
    pub fn new(league: League, current: &[LeagueMember]) -> Self {
        let mut members = vec![league.user_id.clone()];
        for member in current {
            if !members.contains(&member.user_id) {
                members.push(member.user_id.clone());
            }
        }
        Self { league, members, input: String::new(), selected: 0 }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_whitespace() && c != ',' {
            self.input.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.input.pop();
    }

    /// Move the typed id into the list. False when there was nothing new.
    pub fn add(&mut self) -> bool {
        let id = self.input.trim().to_owned();
        self.input.clear();
        if id.is_empty() || self.members.contains(&id) {
            return false;
        }
        self.members.push(id);
        self.selected = self.members.len() - 1;
        true
    }

    pub fn remove_selected(&mut self) -> bool {
        if self.selected == 0 || self.selected >= self.members.len() {
            return false;
        }
        self.members.remove(self.selected);
        self.selected = self.selected.min(self.members.len() - 1);
        true
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.members.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeagueForm {
    Create(CreateLeagueForm),
    Members(MembersForm),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(form: &mut CreateLeagueForm, text: &str) {
        text.chars().for_each(|c| form.push(c));
    }

    #[test]
    fn create_form_fills_fields_in_turn() {
        let mut form = CreateLeagueForm::new("IPL");
        typed(&mut form, "office");
        form.next_field();
        typed(&mut form, "lunch table ");
        form.next_field();
        form.pop();
        form.pop();
        form.pop();
        typed(&mut form, "WC");

        let league = form.to_new_league("fan").unwrap();
        assert_eq!(league.league_name, "office");
        assert_eq!(league.description, "lunch table");
        assert_eq!(league.tournament, "WC");
        assert_eq!(league.user_id, "fan");
    }

    #[test]
    fn league_names_are_short_and_plain() {
        let mut form = CreateLeagueForm::new("IPL");
        assert!(form.to_new_league("fan").is_err());
        typed(&mut form, "my league");
        assert!(form.to_new_league("fan").is_err());
        form.name = "a".repeat(MAX_LEAGUE_NAME + 1);
        assert!(form.to_new_league("fan").is_err());
        form.name = "office-2020".into();
        assert!(form.to_new_league("fan").is_ok());
        form.tournament.clear();
        assert_eq!(form.to_new_league("fan"), Err("Tournament is required"));
    }

    #[test]
    fn members_keep_the_admin_first() {
        let league = League { league_name: "office".into(), user_id: "fan".into(), ..Default::default() };
        let current = vec![
            LeagueMember { league_name: "office".into(), user_id: "fan".into() },
            LeagueMember { league_name: "office".into(), user_id: "mum".into() },
        ];
        let mut form = MembersForm::new(league, &current);
        assert_eq!(form.members, vec!["fan", "mum"]);

        form.push('d');
        form.push(' ');
        form.push('a');
        form.push('d');
        assert!(form.add());
        assert!(form.input.is_empty());
        form.input = "mum".into();
        assert!(!form.add());
        assert_eq!(form.members, vec!["fan", "mum", "dad"]);

        form.selected = 0;
        assert!(!form.remove_selected());
        form.select_next();
        assert!(form.remove_selected());
        assert_eq!(form.members, vec!["fan", "dad"]);
        assert_eq!(form.selected, 1);
    }
}
