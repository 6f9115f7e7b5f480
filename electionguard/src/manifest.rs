use crate::*;
use chrono::{DateTime, FixedOffset, Utc};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashSet;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElectionType {
    Unknown,
    General,
    PartisanPrimaryClosed,
    PartisanPrimaryOpen,
    Primary,
    Runoff,
    Special,
    Other,
}

impl ElectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionType::Unknown => "unknown",
            ElectionType::General => "general",
            ElectionType::PartisanPrimaryClosed => "partisan_primary_closed",
            ElectionType::PartisanPrimaryOpen => "partisan_primary_open",
            ElectionType::Primary => "primary",
            ElectionType::Runoff => "runoff",
            ElectionType::Special => "special",
            ElectionType::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoteVariationType {
    Unknown,
    OneOfM,
    Approval,
    Borda,
    Cumulative,
    Majority,
    NOfM,
    Plurality,
    Proportional,
    Range,
    Rcv,
    SuperMajority,
    Other,
}

impl VoteVariationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteVariationType::Unknown => "unknown",
            VoteVariationType::OneOfM => "one_of_m",
            VoteVariationType::Approval => "approval",
            VoteVariationType::Borda => "borda",
            VoteVariationType::Cumulative => "cumulative",
            VoteVariationType::Majority => "majority",
            VoteVariationType::NOfM => "n_of_m",
            VoteVariationType::Plurality => "plurality",
            VoteVariationType::Proportional => "proportional",
            VoteVariationType::Range => "range",
            VoteVariationType::Rcv => "rcv",
            VoteVariationType::SuperMajority => "super_majority",
            VoteVariationType::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedString {
    pub annotation: String,
    pub value: String,
}

impl CryptoHashable for AnnotatedString {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[(&self.annotation).into(), (&self.value).into()])
    }
}

fn default_language() -> String {
    "en".to_owned()
}

/// A string in a specific language.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Language {
    pub value: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl CryptoHashable for Language {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[(&self.value).into(), (&self.language).into()])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct InternationalizedText {
    #[serde(default)]
    pub text: Vec<Language>,
}

impl CryptoHashable for InternationalizedText {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[hash_list(&self.text)])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Vec<AnnotatedString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Vec<AnnotatedString>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CryptoHashable for ContactInformation {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            self.name.as_ref().into(),
            string_list(&self.address_line),
            optional_list(&self.email),
            optional_list(&self.phone),
        ])
    }
}

fn string_list(items: &Option<Vec<String>>) -> Hashable<'_> {
    match items {
        Some(items) => Hashable::List(items.iter().map(Hashable::from).collect()),
        None => Hashable::Null,
    }
}

fn optional_list<T: CryptoHashable>(items: &Option<Vec<T>>) -> Hashable<'static> {
    match items {
        Some(items) => hash_list(items),
        None => Hashable::Null,
    }
}

fn optional_hash<T: CryptoHashable>(item: &Option<T>) -> Hashable<'static> {
    item.as_ref().map(|i| i.crypto_hash()).into()
}

/// A physical or virtual unit of representation or vote/seat aggregation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GeopoliticalUnit {
    pub object_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_information: Option<ContactInformation>,
}

impl CryptoHashable for GeopoliticalUnit {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            (&self.name).into(),
            (&self.unit_type).into(),
            optional_hash(&self.contact_information),
        ])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BallotStyle {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geopolitical_unit_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl CryptoHashable for BallotStyle {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            string_list(&self.geopolitical_unit_ids),
            string_list(&self.party_ids),
            self.image_uri.as_ref().into(),
        ])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Party {
    pub object_id: String,
    #[serde(default)]
    pub name: InternationalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl CryptoHashable for Party {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            self.name.crypto_hash().into(),
            self.abbreviation.as_ref().into(),
            self.color.as_ref().into(),
            self.logo_uri.as_ref().into(),
        ])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub object_id: String,
    #[serde(default)]
    pub name: InternationalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_write_in: Option<bool>,
}

impl CryptoHashable for Candidate {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            self.name.crypto_hash().into(),
            self.party_id.as_ref().into(),
            self.image_uri.as_ref().into(),
        ])
    }
}

/// One option a voter can select in a contest.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectionDescription {
    pub object_id: String,
    pub sequence_order: u64,
    pub candidate_id: String,
}

impl CryptoHashable for SelectionDescription {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            self.sequence_order.into(),
            (&self.candidate_id).into(),
        ])
    }
}

/// A contest on the ballot.
///
/// `placeholder_selections` is empty in a published manifest and filled in by `InternalManifest`.
/// Placeholders do not contribute to the contest's hash.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContestDescription {
    pub object_id: String,
    pub sequence_order: u64,
    pub electoral_district_id: String,
    pub vote_variation: VoteVariationType,
    pub number_elected: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes_allowed: Option<u64>,
    pub name: String,
    pub ballot_selections: Vec<SelectionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_title: Option<InternationalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot_subtitle: Option<InternationalizedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placeholder_selections: Vec<SelectionDescription>,
}

impl CryptoHashable for ContestDescription {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.object_id).into(),
            self.sequence_order.into(),
            (&self.electoral_district_id).into(),
            self.vote_variation.as_str().into(),
            optional_hash(&self.ballot_title),
            optional_hash(&self.ballot_subtitle),
            (&self.name).into(),
            self.number_elected.into(),
            self.votes_allowed.into(),
            hash_list(&self.ballot_selections),
        ])
    }
}

impl ContestDescription {
    /// Check the contest's internal consistency, ignoring placeholders.
    pub fn is_valid(&self) -> bool {
        let selection_count = self.ballot_selections.len();

        let mut candidate_ids = HashSet::new();
        let mut selection_ids = HashSet::new();
        let mut sequence_ids = HashSet::new();
        for selection in &self.ballot_selections {
            candidate_ids.insert(selection.candidate_id.as_str());
            selection_ids.insert(selection.object_id.as_str());
            sequence_ids.insert(selection.sequence_order);
        }

        let number_elected_valid = self.number_elected as usize <= selection_count;
        let votes_allowed_valid = match self.votes_allowed {
            Some(votes_allowed) => self.number_elected <= votes_allowed,
            None => true,
        };
        let candidates_unique = candidate_ids.len() == selection_count;
        let selections_unique = selection_ids.len() == selection_count;
        let sequences_unique = sequence_ids.len() == selection_count;

        let success = number_elected_valid
            && votes_allowed_valid
            && candidates_unique
            && selections_unique
            && sequences_unique;

        if !success {
            warn!(
                "contest {} failed validation: number_elected={} votes_allowed={} \
                 candidates_unique={} selections_unique={} sequences_unique={}",
                self.object_id,
                number_elected_valid,
                votes_allowed_valid,
                candidates_unique,
                selections_unique,
                sequences_unique
            );
        }
        success
    }

    /// Like `is_valid`, also requiring exactly `number_elected` placeholders.
    pub fn is_valid_with_placeholders(&self) -> bool {
        let placeholders_valid = self.placeholder_selections.len() as u64 == self.number_elected;
        if !placeholders_valid {
            warn!(
                "contest {} has {} placeholders but elects {}",
                self.object_id,
                self.placeholder_selections.len(),
                self.number_elected
            );
        }
        self.is_valid() && placeholders_valid
    }

    /// Find a real or placeholder selection by id.
    pub fn selection_for(&self, selection_id: &str) -> Option<&SelectionDescription> {
        self.ballot_selections
            .iter()
            .chain(self.placeholder_selections.iter())
            .find(|s| s.object_id == selection_id)
    }

    pub fn is_placeholder(&self, selection: &SelectionDescription) -> bool {
        self.placeholder_selections
            .iter()
            .any(|p| p.object_id == selection.object_id)
    }
}

/// Generate a placeholder selection for `contest`.
///
/// Without `use_sequence_id` the placeholder takes the sequence order after the largest existing
/// one. A requested sequence order that is already taken is an error.
pub fn generate_placeholder_selection_from(
    contest: &ContestDescription,
    use_sequence_id: Option<u64>,
) -> Result<SelectionDescription, Error> {
    let sequence_ids: HashSet<u64> = contest
        .ballot_selections
        .iter()
        .map(|s| s.sequence_order)
        .collect();

    let sequence_order = match use_sequence_id {
        Some(id) if sequence_ids.contains(&id) => {
            return Err(Error::SequenceCollision(contest.object_id.clone(), id))
        }
        Some(id) => id,
        None => next_sequence_order(contest),
    };

    Ok(SelectionDescription {
        object_id: format!("{}-{}-placeholder", contest.object_id, sequence_order),
        sequence_order,
        candidate_id: format!("{}-{}-candidate", contest.object_id, sequence_order),
    })
}

/// Generate `count` placeholders following the contest's largest sequence order.
pub fn generate_placeholder_selections_from(
    contest: &ContestDescription,
    count: u64,
) -> Result<Vec<SelectionDescription>, Error> {
    let start = next_sequence_order(contest);
    (start..start + count)
        .map(|sequence_order| generate_placeholder_selection_from(contest, Some(sequence_order)))
        .collect()
}

fn next_sequence_order(contest: &ContestDescription) -> u64 {
    contest
        .ballot_selections
        .iter()
        .map(|s| s.sequence_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// The published description of an election.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub election_scope_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(rename = "type")]
    pub election_type: ElectionType,
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub geopolitical_units: Vec<GeopoliticalUnit>,
    pub parties: Vec<Party>,
    pub candidates: Vec<Candidate>,
    pub contests: Vec<ContestDescription>,
    pub ballot_styles: Vec<BallotStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<InternationalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_information: Option<ContactInformation>,
}

fn iso_date(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

impl CryptoHashable for Manifest {
    fn crypto_hash(&self) -> ElementModQ {
        hash_elems(&[
            (&self.election_scope_id).into(),
            self.election_type.as_str().into(),
            iso_date(&self.start_date).into(),
            iso_date(&self.end_date).into(),
            optional_hash(&self.name),
            optional_hash(&self.contact_information),
            hash_list(&self.geopolitical_units),
            hash_list(&self.parties),
            hash_list(&self.contests),
            hash_list(&self.ballot_styles),
        ])
    }
}

fn all_unique<'a, I: IntoIterator<Item = &'a str>>(ids: I) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().all(|id| seen.insert(id))
}

impl Manifest {
    /// Check that the manifest is internally consistent.
    pub fn is_valid(&self) -> bool {
        let gp_unit_ids: HashSet<&str> = self
            .geopolitical_units
            .iter()
            .map(|g| g.object_id.as_str())
            .collect();
        let party_ids: HashSet<&str> = self.parties.iter().map(|p| p.object_id.as_str()).collect();
        let candidate_ids: HashSet<&str> = self
            .candidates
            .iter()
            .map(|c| c.object_id.as_str())
            .collect();

        let gp_units_valid = gp_unit_ids.len() == self.geopolitical_units.len();

        let ballot_styles_valid = all_unique(self.ballot_styles.iter().map(|b| b.object_id.as_str()))
            && self.ballot_styles.iter().all(|style| {
                style
                    .geopolitical_unit_ids
                    .iter()
                    .flatten()
                    .all(|id| gp_unit_ids.contains(id.as_str()))
            });

        let parties_valid = party_ids.len() == self.parties.len();

        let candidates_valid = candidate_ids.len() == self.candidates.len()
            && self.candidates.iter().all(|c| match &c.party_id {
                Some(party_id) => party_ids.contains(party_id.as_str()),
                None => true,
            });

        let contests_valid = all_unique(self.contests.iter().map(|c| c.object_id.as_str()))
            && self.contests.len()
                == self
                    .contests
                    .iter()
                    .map(|c| c.sequence_order)
                    .collect::<HashSet<_>>()
                    .len()
            && self.contests.iter().all(|contest| {
                contest.is_valid()
                    && gp_unit_ids.contains(contest.electoral_district_id.as_str())
                    && contest
                        .ballot_selections
                        .iter()
                        .all(|s| candidate_ids.contains(s.candidate_id.as_str()))
            });

        let success =
            gp_units_valid && ballot_styles_valid && parties_valid && candidates_valid && contests_valid;

        if !success {
            warn!(
                "manifest {} failed validation: geopolitical_units={} ballot_styles={} parties={} \
                 candidates={} contests={}",
                self.election_scope_id,
                gp_units_valid,
                ballot_styles_valid,
                parties_valid,
                candidates_valid,
                contests_valid
            );
        }
        success
    }
}

/// A manifest prepared for encryption: hashed once, with placeholders added to every contest.
#[derive(Clone, Debug)]
pub struct InternalManifest {
    pub manifest: Manifest,
    pub manifest_hash: ElementModQ,
    pub contests: IndexMap<String, ContestDescription>,
}

impl InternalManifest {
    pub fn new(manifest: Manifest) -> Result<Self, Error> {
        let manifest_hash = manifest.crypto_hash();

        let mut contests = IndexMap::with_capacity(manifest.contests.len());
        for contest in &manifest.contests {
            let mut contest = contest.clone();
            contest.placeholder_selections =
                generate_placeholder_selections_from(&contest, contest.number_elected)?;
            contests.insert(contest.object_id.clone(), contest);
        }

        debug!(
            "prepared manifest {} with hash {}",
            manifest.election_scope_id, manifest_hash
        );

        Ok(InternalManifest {
            manifest,
            manifest_hash,
            contests,
        })
    }

    pub fn contest_for(&self, contest_id: &str) -> Option<&ContestDescription> {
        self.contests.get(contest_id)
    }

    pub fn get_ballot_style(&self, style_id: &str) -> Option<&BallotStyle> {
        self.manifest
            .ballot_styles
            .iter()
            .find(|style| style.object_id == style_id)
    }

    /// Contests in districts covered by the ballot style, in manifest order.
    pub fn get_contests_for(&self, style_id: &str) -> Vec<&ContestDescription> {
        let gp_unit_ids = match self
            .get_ballot_style(style_id)
            .and_then(|style| style.geopolitical_unit_ids.as_ref())
        {
            Some(ids) => ids,
            None => return vec![],
        };

        self.contests
            .values()
            .filter(|contest| gp_unit_ids.contains(&contest.electoral_district_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn contest(number_elected: u64, votes_allowed: Option<u64>) -> ContestDescription {
        ContestDescription {
            object_id: "contest".to_owned(),
            sequence_order: 0,
            electoral_district_id: "district".to_owned(),
            vote_variation: VoteVariationType::NOfM,
            number_elected,
            votes_allowed,
            name: "Contest".to_owned(),
            ballot_selections: vec![
                SelectionDescription {
                    object_id: "a-selection".to_owned(),
                    sequence_order: 0,
                    candidate_id: "a".to_owned(),
                },
                SelectionDescription {
                    object_id: "b-selection".to_owned(),
                    sequence_order: 1,
                    candidate_id: "b".to_owned(),
                },
                SelectionDescription {
                    object_id: "c-selection".to_owned(),
                    sequence_order: 4,
                    candidate_id: "c".to_owned(),
                },
            ],
            ballot_title: None,
            ballot_subtitle: None,
            placeholder_selections: vec![],
        }
    }

    #[test]
    fn test_contest_validity() {
        assert!(contest(2, Some(2)).is_valid());
        assert!(contest(3, None).is_valid());
        assert!(!contest(4, None).is_valid());
        assert!(!contest(2, Some(1)).is_valid());

        let mut duplicate_candidate = contest(1, None);
        duplicate_candidate.ballot_selections[1].candidate_id = "a".to_owned();
        assert!(!duplicate_candidate.is_valid());

        let mut duplicate_sequence = contest(1, None);
        duplicate_sequence.ballot_selections[2].sequence_order = 0;
        assert!(!duplicate_sequence.is_valid());

        let mut duplicate_selection = contest(1, None);
        duplicate_selection.ballot_selections[2].object_id = "b-selection".to_owned();
        assert!(!duplicate_selection.is_valid());
    }

    #[test]
    fn test_placeholders() {
        let contest = contest(2, Some(2));

        let placeholder = generate_placeholder_selection_from(&contest, None).unwrap();
        assert_eq!(placeholder.sequence_order, 5);
        assert_eq!(placeholder.object_id, "contest-5-placeholder");
        assert_eq!(placeholder.candidate_id, "contest-5-candidate");

        let placeholder = generate_placeholder_selection_from(&contest, Some(2)).unwrap();
        assert_eq!(placeholder.object_id, "contest-2-placeholder");

        let placeholders = generate_placeholder_selections_from(&contest, 2).unwrap();
        let orders: Vec<u64> = placeholders.iter().map(|p| p.sequence_order).collect();
        assert_eq!(orders, vec![5, 6]);
        assert!(generate_placeholder_selections_from(&contest, 0).unwrap().is_empty());
    }

    #[test]
    fn test_placeholder_collision() {
        let contest = contest(1, None);
        assert!(matches!(
            generate_placeholder_selection_from(&contest, Some(4)),
            Err(Error::SequenceCollision(ref id, 4)) if id == "contest"
        ));
    }

    #[test]
    fn test_placeholders_do_not_change_hash() {
        let mut with_placeholders = contest(2, Some(2));
        let hash = with_placeholders.crypto_hash();
        with_placeholders.placeholder_selections =
            generate_placeholder_selections_from(&with_placeholders, 2).unwrap();

        assert_eq!(with_placeholders.crypto_hash(), hash);
        assert!(with_placeholders.is_valid_with_placeholders());
        assert!(!contest(2, Some(2)).is_valid_with_placeholders());

        let placeholder = with_placeholders.placeholder_selections[0].clone();
        assert!(with_placeholders.is_placeholder(&placeholder));
        assert!(!with_placeholders.is_placeholder(&with_placeholders.ballot_selections[0]));
        assert_eq!(
            with_placeholders.selection_for("contest-6-placeholder").map(|s| s.sequence_order),
            Some(6)
        );
        assert!(with_placeholders.selection_for("missing").is_none());
    }

    #[test]
    fn test_hash_sensitivity() {
        let base = contest(2, Some(2));
        let mut renamed = base.clone();
        renamed.name = "Other".to_owned();
        assert_ne!(base.crypto_hash(), renamed.crypto_hash());

        let mut no_limit = base.clone();
        no_limit.votes_allowed = None;
        assert_ne!(base.crypto_hash(), no_limit.crypto_hash());
    }

    #[test]
    fn test_iso_date() {
        let date = DateTime::parse_from_rfc3339("2020-03-01T08:00:00-05:00").unwrap();
        assert_eq!(iso_date(&date), "2020-03-01T13:00:00Z");
    }

    #[test]
    fn test_vote_variation_names() {
        let unknown: VoteVariationType = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(unknown, VoteVariationType::Unknown);
        assert_eq!(unknown.as_str(), "unknown");

        for variation in &[VoteVariationType::NOfM, VoteVariationType::SuperMajority] {
            let json = serde_json::to_string(variation).unwrap();
            assert_eq!(json, format!("\"{}\"", variation.as_str()));
        }
    }
}
