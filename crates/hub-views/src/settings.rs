use hub_client::{Hub, HubError, ImageRef, ImageUpload, Result};
use hub_types::Account;
use hub_types::api::ProfileUpdate;

/// Editable copy of the profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
}

impl ProfileForm {
    pub fn from_account(account: &Account) -> Self {
        Self {
            display_name: account.display_name.clone().unwrap_or_default(),
            bio: account.bio.clone().unwrap_or_default(),
            avatar: account.avatar.clone().unwrap_or_default(),
        }
    }

    fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            display_name: Some(self.display_name.trim().to_string()),
            bio: Some(self.bio.trim().to_string()),
            avatar: Some(self.avatar.trim().to_string()).filter(|a| !a.is_empty()),
        }
    }
}

/// Inline feedback under the forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ProfileSaved,
    PasswordChanged,
    Error(String),
}

pub struct Settings {
    hub: Hub,
    pub form: ProfileForm,
    notice: Option<Notice>,
}

impl Settings {
    pub async fn open(hub: Hub) -> Result<Self> {
        let me = hub.session().require().await?;
        Ok(Self {
            form: ProfileForm::from_account(&me),
            hub,
            notice: None,
        })
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Relay a new avatar and put its URL in the form. Not saved until
    /// [`Settings::save_profile`].
    pub async fn upload_avatar(&mut self, upload: ImageUpload) -> ImageRef {
        let image = self.hub.images().upload_or_preview(&upload).await;
        self.form.avatar = image.url().to_string();
        image
    }

    pub async fn save_profile(&mut self) -> Result<Account> {
        let result = self.hub.update_profile(self.form.to_update()).await;
        self.settle(result, Notice::ProfileSaved)
    }

    pub async fn change_password(&mut self, current: &str, new: &str, confirm: &str) -> Result<()> {
        let result = self.hub.change_password(current, new, confirm).await;
        self.settle(result, Notice::PasswordChanged)
    }

    fn settle<T>(&mut self, result: Result<T>, success: Notice) -> Result<T> {
        self.notice = Some(match &result {
            Ok(_) => success,
            Err(e) => Notice::Error(describe(e)),
        });
        result
    }
}

fn describe(error: &HubError) -> String {
    match error {
        HubError::InvalidCredentials => "current password is incorrect".into(),
        e if e.is_user_facing() => e.to_string(),
        _ => "something went wrong, try again".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_avatar_is_left_alone() {
        let form = ProfileForm {
            display_name: " Ada ".into(),
            bio: String::new(),
            avatar: "  ".into(),
        };
        let update = form.to_update();
        assert_eq!(update.display_name.as_deref(), Some("Ada"));
        assert_eq!(update.bio.as_deref(), Some(""));
        assert!(update.avatar.is_none());
    }

    #[test]
    fn error_wording() {
        assert_eq!(describe(&HubError::InvalidCredentials), "current password is incorrect");
        assert_eq!(
            describe(&HubError::Validation("passwords do not match")),
            "passwords do not match"
        );
        assert_eq!(
            describe(&HubError::Upload("boom".into())),
            "something went wrong, try again"
        );
    }
}
