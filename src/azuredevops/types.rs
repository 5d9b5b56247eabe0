use serde::{Deserialize, Serialize};

use super::CustomTime;

/// `resource` of a `git.pullrequest.*` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PullRequestEventResource {
    pub repository: Repository,
    pub pull_request_id: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub code_review_id: i64,
    pub status: String,
    pub created_by: User,
    pub creation_date: CustomTime,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub source_ref_name: String,
    pub target_ref_name: String,
    pub merge_status: String,
    #[serde(skip_serializing_if = "is_false")]
    pub is_draft: bool,
    pub merge_id: String,
    pub last_merge_source_commit: Commit,
    pub last_merge_target_commit: Commit,
    pub last_merge_commit: Commit,
    pub reviewers: Vec<User>,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: Links,
    #[serde(skip_serializing_if = "is_false")]
    pub supports_iterations: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub artifact_id: String,
}

/// `resource` of a `git.push` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushEventResource {
    pub commits: Vec<Commit>,
    pub ref_updates: Vec<RefUpdate>,
    pub repository: Repository,
    pub pushed_by: User,
    pub push_id: i64,
    pub date: CustomTime,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Commit {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub commit_id: String,
    pub author: User,
    pub committer: User,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefUpdate {
    pub name: String,
    pub old_object_id: String,
    pub new_object_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub url: String,
    pub project: Project,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    pub remote_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_in_maintenance: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub url: String,
    pub state: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub revision: i64,
    pub visibility: String,
    pub last_update_time: CustomTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub date: CustomTime,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(rename = "_links")]
    pub links: Links,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub unique_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceContainers {
    pub collection: Container,
    pub account: Container,
    pub project: Container,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    pub web: Href,
    pub statuses: Href,
    pub avatar: Href,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Href {
    pub href: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    const PULL_REQUEST: &str = r#"{
        "repository": {
            "id": "3c4e22ee-6148-45a3-913b-454009dac91d",
            "name": "hello-world",
            "url": "https://dev.azure.com/fabrikam/_apis/git/repositories/3c4e22ee",
            "project": {
                "id": "a7573007-bbb3-4341-b726-0c4148a07853",
                "name": "Fabrikam",
                "state": "wellFormed",
                "visibility": "private",
                "lastUpdateTime": "0001-01-01T00:00:00"
            },
            "remoteUrl": "https://dev.azure.com/fabrikam/Fabrikam/_git/hello-world"
        },
        "pullRequestId": 1,
        "status": "active",
        "createdBy": {
            "displayName": "Jamal Hartnett",
            "id": "54d125f7-69f7-4191-904f-c5b96b6261c8",
            "uniqueName": "fabrikamfiber4@hotmail.com"
        },
        "creationDate": "2024-06-15T20:28:54.7460386Z",
        "title": "my first pull request",
        "sourceRefName": "refs/heads/mytopic",
        "targetRefName": "refs/heads/main",
        "mergeStatus": "succeeded",
        "mergeId": "a10bb228-6ba6-4362-abd7-49ea21333dbd",
        "lastMergeSourceCommit": {
            "commitId": "53d54ac915144006c2c9e90d2c7d3880920db49c",
            "url": "https://dev.azure.com/fabrikam/_apis/git/repositories/3c4e22ee/commits/53d54ac9"
        },
        "lastMergeTargetCommit": {
            "commitId": "a511f535b1ea495ee0c903badb68fbc83772c882"
        },
        "reviewers": [
            {"displayName": "[Mobile]\\Mobile Team", "id": "2ea2d095-48f9-4cd6-9966-62f6f574096c"}
        ],
        "url": "https://dev.azure.com/fabrikam/_apis/git/repositories/3c4e22ee/pullRequests/1",
        "_links": {
            "web": {"href": "https://dev.azure.com/fabrikam/Fabrikam/_git/hello-world/pullrequest/1"},
            "statuses": {"href": "https://dev.azure.com/fabrikam/_apis/git/repositories/3c4e22ee/pullRequests/1/statuses"}
        }
    }"#;

    const PUSH: &str = r#"{
        "commits": [
            {
                "commitId": "33b55f7cb7e7e245323987634f960cf4a6e6bc74",
                "author": {"name": "Jamal Hartnett", "email": "fabrikamfiber4@hotmail.com", "date": "2024-02-25T19:01:00Z"},
                "committer": {"name": "Jamal Hartnett", "email": "fabrikamfiber4@hotmail.com", "date": "2024-02-25T19:01:00Z"},
                "comment": "Fixed bug in web.config file"
            }
        ],
        "refUpdates": [
            {
                "name": "refs/heads/main",
                "oldObjectId": "aad331d8d3b131fa9ae03cf5e53965b51942618a",
                "newObjectId": "33b55f7cb7e7e245323987634f960cf4a6e6bc74"
            }
        ],
        "repository": {
            "id": "278d5cd2-584d-4b63-824a-2ba458937249",
            "name": "Fabrikam-Fiber-Git",
            "remoteUrl": "https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam-Fiber-Git",
            "size": 1024
        },
        "pushedBy": {"displayName": "Jamal Hartnett", "date": ""},
        "pushId": 14,
        "date": "2024-02-25T19:01:00Z",
        "url": "https://dev.azure.com/fabrikam/DefaultCollection/_apis/git/repositories/278d5cd2/pushes/14"
    }"#;

    #[test]
    fn test_pull_request_event() {
        let pr: PullRequestEventResource = serde_json::from_str(PULL_REQUEST).unwrap();

        assert_eq!(pr.pull_request_id, 1);
        assert_eq!(pr.source_ref_name, "refs/heads/mytopic");
        assert_eq!(
            pr.last_merge_source_commit.commit_id,
            "53d54ac915144006c2c9e90d2c7d3880920db49c"
        );
        assert!(pr.last_merge_commit.commit_id.is_empty());
        assert!(pr.repository.project.last_update_time.is_zero());
        assert!(!pr.creation_date.is_zero());
        assert_eq!(pr.reviewers.len(), 1);
        assert!(pr.links.statuses.href.ends_with("/statuses"));
        assert!(!pr.is_draft);
    }

    #[test]
    fn test_push_event() {
        let push: PushEventResource = serde_json::from_str(PUSH).unwrap();

        assert_eq!(push.push_id, 14);
        assert_eq!(push.ref_updates[0].name, "refs/heads/main");
        assert_eq!(push.commits[0].comment, "Fixed bug in web.config file");
        assert_eq!(push.repository.size, Some(1024));
        assert_eq!(push.repository.ssh_url, None);
        assert!(push.pushed_by.date.is_zero());
        assert_eq!(push.commits[0].author.date.0.unwrap().timestamp(), 1_708_887_660);
    }

    #[test]
    fn test_malformed_date_rejects_payload() {
        let payload = r#"{"pushId": 1, "date": "yesterday"}"#;
        let result: Result<PushEventResource, _> = serde_json::from_str(payload);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_skips_empty_optionals() {
        let commit = Commit {
            commit_id: "abc".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&commit).unwrap();
        assert_eq!(json["commitId"], "abc");
        assert!(json.get("comment").is_none());
        assert!(json.get("url").is_none());
    }
}
